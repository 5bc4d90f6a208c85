/// Minimal GIF block walker.
///
/// Radar products are published as GIFs whose generation time is stored in
/// a Comment Extension. Only the block structure is walked here: color
/// tables and LZW image data are skipped by length, never decoded.
///
/// Layout (GIF89a):
///   header "GIF87a"/"GIF89a" (6) | logical screen descriptor (7)
///   [global color table] | blocks... | trailer 0x3B

use crate::model::ContainerError;

const EXTENSION_INTRODUCER: u8 = 0x21;
const IMAGE_SEPARATOR: u8 = 0x2C;
const TRAILER: u8 = 0x3B;
const COMMENT_LABEL: u8 = 0xFE;

const HEADER_LEN: usize = 6;
const SCREEN_DESCRIPTOR_LEN: usize = 7;
const IMAGE_DESCRIPTOR_LEN: usize = 9;

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn byte(&mut self) -> Result<u8, ContainerError> {
        let b = *self
            .bytes
            .get(self.pos)
            .ok_or(ContainerError::Truncated(self.pos))?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ContainerError> {
        let end = self.pos + len;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or(ContainerError::Truncated(self.bytes.len()))?;
        self.pos = end;
        Ok(slice)
    }

    /// Reads a run of data sub-blocks up to the zero-length terminator.
    fn sub_blocks(&mut self, mut sink: impl FnMut(&'a [u8])) -> Result<(), ContainerError> {
        loop {
            let len = self.byte()? as usize;
            if len == 0 {
                return Ok(());
            }
            sink(self.take(len)?);
        }
    }
}

/// Size in bytes of a color table given a packed-fields byte, if present.
fn color_table_len(packed: u8) -> usize {
    if packed & 0x80 == 0 {
        0
    } else {
        3 * (1 << ((packed & 0x07) + 1))
    }
}

/// Returns the raw bytes of the first comment extension that precedes the
/// first image frame, or `None` if the first frame carries no comment.
pub fn read_comment(bytes: &[u8]) -> Result<Option<Vec<u8>>, ContainerError> {
    let signature = bytes.get(..HEADER_LEN).ok_or(ContainerError::NotGif)?;
    if signature != b"GIF87a" && signature != b"GIF89a" {
        return Err(ContainerError::NotGif);
    }

    let mut cursor = Cursor { bytes, pos: HEADER_LEN };
    let screen = cursor.take(SCREEN_DESCRIPTOR_LEN)?;
    cursor.take(color_table_len(screen[4]))?;

    loop {
        let offset = cursor.pos;
        match cursor.byte()? {
            EXTENSION_INTRODUCER => {
                let label = cursor.byte()?;
                if label == COMMENT_LABEL {
                    let mut comment = Vec::new();
                    cursor.sub_blocks(|chunk| comment.extend_from_slice(chunk))?;
                    return Ok(Some(comment));
                }
                cursor.sub_blocks(|_| {})?;
            }
            // The first frame's metadata ends at its image descriptor.
            IMAGE_SEPARATOR | TRAILER => return Ok(None),
            byte => return Err(ContainerError::UnknownBlock { byte, offset }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::fixtures::gif_with_comment;
    use super::*;

    #[test]
    fn test_reads_comment_before_first_frame() {
        let gif = gif_with_comment(Some(b"2024-06-01T08:30:00"));
        assert_eq!(
            read_comment(&gif).expect("valid gif"),
            Some(b"2024-06-01T08:30:00".to_vec())
        );
    }

    #[test]
    fn test_no_comment_is_none() {
        let gif = gif_with_comment(None);
        assert_eq!(read_comment(&gif).expect("valid gif"), None);
    }

    #[test]
    fn test_long_comment_spanning_sub_blocks_is_concatenated() {
        let text = vec![b'x'; 600];
        let gif = gif_with_comment(Some(&text));
        assert_eq!(read_comment(&gif).expect("valid gif"), Some(text));
    }

    #[test]
    fn test_comment_after_first_frame_is_ignored() {
        let mut gif = gif_with_comment(None);
        gif.pop(); // trailer
        gif.extend_from_slice(&[0x21, 0xFE, 0x03, b'a', b'b', b'c', 0x00, 0x3B]);
        assert_eq!(read_comment(&gif).expect("valid gif"), None);
    }

    #[test]
    fn test_non_gif_payload_is_rejected() {
        assert_eq!(read_comment(b"<html>404</html>"), Err(ContainerError::NotGif));
        assert_eq!(read_comment(b"GIF"), Err(ContainerError::NotGif));
    }

    #[test]
    fn test_truncated_payload_is_rejected() {
        let gif = gif_with_comment(Some(b"2024-06-01T08:30:00"));
        let cut = &gif[..gif.len() - 20];
        assert!(matches!(read_comment(cut), Err(ContainerError::Truncated(_))));
    }

    #[test]
    fn test_garbage_block_is_rejected() {
        let mut gif = gif_with_comment(None);
        // Replace the graphic control introducer with junk.
        gif[19] = 0x99;
        assert_eq!(
            read_comment(&gif),
            Err(ContainerError::UnknownBlock { byte: 0x99, offset: 19 })
        );
    }

    #[test]
    fn test_color_table_len() {
        assert_eq!(color_table_len(0x00), 0);
        assert_eq!(color_table_len(0x80), 6);
        assert_eq!(color_table_len(0x87), 768);
    }
}
