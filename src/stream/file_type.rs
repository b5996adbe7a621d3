use std::path::Path;

/// Content kinds a served file can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileType {
    #[default]
    None,
    Amf,
    Swf,
    Html,
    Png,
    Jpeg,
    Gif,
    Mp3,
    Mp4,
    Ogg,
    Vorbis,
    Theora,
    Dirac,
    Text,
    Flv,
    Vp6,
    Xml,
    Flac,
    Encoded,
    Php,
}

impl FileType {
    /// Guess from the file suffix, case insensitive
    pub fn from_path(path: &Path) -> FileType {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return FileType::None;
        };
        match ext.to_ascii_lowercase().as_str() {
            "htm" | "html" => FileType::Html,
            "ogg" | "ogv" => FileType::Ogg,
            "swf" => FileType::Swf,
            "php" => FileType::Php,
            "flv" => FileType::Flv,
            "mp3" => FileType::Mp3,
            "flac" => FileType::Flac,
            "jpg" | "jpeg" => FileType::Jpeg,
            "txt" => FileType::Text,
            "xml" => FileType::Xml,
            "mp4" | "mpeg" => FileType::Mp4,
            "png" => FileType::Png,
            "gif" => FileType::Gif,
            _ => FileType::None,
        }
    }

    /// Guess from the leading bytes of the file
    pub fn sniff(data: &[u8]) -> FileType {
        if data.get(6..10) == Some(b"JFIF".as_slice()) {
            return FileType::Jpeg;
        }
        if data.starts_with(b"FWS") || data.starts_with(b"CWS") {
            return FileType::Swf;
        }
        if data.starts_with(b"FLV") {
            return FileType::Flv;
        }
        if data.starts_with(b"\x89PNG") {
            return FileType::Png;
        }
        if data.starts_with(b"OggS") {
            // codec id of the first packet, after its one byte packet type
            return if codec_at(data, b"theora") {
                FileType::Theora
            } else if codec_at(data, b"FLAC") {
                FileType::Flac
            } else if codec_at(data, b"vorbis") {
                FileType::Vorbis
            } else {
                FileType::Ogg
            };
        }
        if data.starts_with(b"ID3") {
            return FileType::Mp3;
        }
        if data.starts_with(b"<?xml") {
            return FileType::Xml;
        }
        let head = &data[..data.len().min(16)];
        let lower = head.to_ascii_lowercase();
        if lower.starts_with(b"<!doctype html") || lower.starts_with(b"<html") {
            return FileType::Html;
        }
        FileType::None
    }

    pub fn is_media(self) -> bool {
        matches!(
            self,
            FileType::Flv
                | FileType::Mp3
                | FileType::Mp4
                | FileType::Ogg
                | FileType::Vorbis
                | FileType::Theora
                | FileType::Dirac
                | FileType::Vp6
                | FileType::Flac
        )
    }
}

fn codec_at(data: &[u8], name: &[u8]) -> bool {
    [28, 29]
        .iter()
        .any(|&at| data.get(at..).is_some_and(|d| d.starts_with(name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(FileType::from_path(Path::new("/var/www/index.HTML")), FileType::Html);
        assert_eq!(FileType::from_path(Path::new("clip.flv")), FileType::Flv);
        assert_eq!(FileType::from_path(Path::new("photo.jpeg")), FileType::Jpeg);
        assert_eq!(FileType::from_path(Path::new("movie.ogv")), FileType::Ogg);
        assert_eq!(FileType::from_path(Path::new("README")), FileType::None);
        assert_eq!(FileType::from_path(Path::new("archive.tar.gz")), FileType::None);
    }

    #[test]
    fn test_sniff() {
        assert_eq!(FileType::sniff(b"FLV\x01\x05\x00\x00\x00\x09"), FileType::Flv);
        assert_eq!(FileType::sniff(b"CWS\x0a"), FileType::Swf);
        assert_eq!(FileType::sniff(b"\x89PNG\r\n\x1a\n"), FileType::Png);
        assert_eq!(FileType::sniff(b"\xff\xd8\xff\xe0\x00\x10JFIF\x00"), FileType::Jpeg);
        assert_eq!(FileType::sniff(b"ID3\x03\x00"), FileType::Mp3);
        assert_eq!(FileType::sniff(b"<?xml version=\"1.0\"?>"), FileType::Xml);
        assert_eq!(FileType::sniff(b"<!DOCTYPE html>"), FileType::Html);
        assert_eq!(FileType::sniff(b"plain words"), FileType::None);
        assert_eq!(FileType::sniff(&[]), FileType::None);
    }

    #[test]
    fn test_sniff_ogg_codecs() {
        let mut page = b"OggS".to_vec();
        page.resize(28, 0);
        page.push(0x01);
        page.extend_from_slice(b"vorbis");
        assert_eq!(FileType::sniff(&page), FileType::Vorbis);

        page.truncate(28);
        page.push(0x80);
        page.extend_from_slice(b"theora");
        assert_eq!(FileType::sniff(&page), FileType::Theora);

        page.truncate(28);
        assert_eq!(FileType::sniff(&page), FileType::Ogg);
    }
}
