//! 存储式 ZIP 容器写出
//!
//! EPUB 容器用的最小 ZIP 写出器：全部条目无压缩（method 0），
//! 文件名按 UTF-8 标志写入，CRC-32 逐条计算。
//! 偏移与尺寸用 32 位表示，不支持 ZIP64（分卷阈值远低于 4GB 上限）

/// Local file header signature (little-endian)
const SIG_LOCAL_FILE_HEADER: u32 = 0x04034b50;

/// Central directory entry signature (little-endian)
const SIG_CD_ENTRY: u32 = 0x02014b50;

/// End of central directory signature (little-endian)
const SIG_EOCD: u32 = 0x06054b50;

/// 无压缩
const METHOD_STORED: u16 = 0;

/// 通用标志：文件名与注释为 UTF-8
const FLAG_UTF8_NAMES: u16 = 0x0800;

const VERSION_NEEDED: u16 = 20;

/// 固定时间戳 1980-01-01 00:00:00（MS-DOS 形式）
const DOS_TIME: u16 = 0x0000;
const DOS_DATE: u16 = 0x0021;

/// 中央目录用的条目记录
struct EntryRecord {
    name: String,
    crc32: u32,
    size: u32,
    local_header_offset: u32,
}

/// 存储式 ZIP 写出器
///
/// 条目按 `add_entry` 的调用顺序排列；EPUB 规范要求的
/// 先头 `mimetype` 条目由调用方保证最先加入
pub struct ZipArchiveWriter {
    buf: Vec<u8>,
    entries: Vec<EntryRecord>,
}

impl ZipArchiveWriter {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// 追加一个无压缩条目
    pub fn add_entry(&mut self, name: &str, data: &[u8]) {
        let local_header_offset = self.buf.len() as u32;
        let crc32 = crc32fast::hash(data);
        let size = data.len() as u32;

        push_u32(&mut self.buf, SIG_LOCAL_FILE_HEADER);
        push_u16(&mut self.buf, VERSION_NEEDED);
        push_u16(&mut self.buf, FLAG_UTF8_NAMES);
        push_u16(&mut self.buf, METHOD_STORED);
        push_u16(&mut self.buf, DOS_TIME);
        push_u16(&mut self.buf, DOS_DATE);
        push_u32(&mut self.buf, crc32);
        push_u32(&mut self.buf, size); // compressed size（無圧縮なので同値）
        push_u32(&mut self.buf, size); // uncompressed size
        push_u16(&mut self.buf, name.len() as u16);
        push_u16(&mut self.buf, 0); // extra field length
        self.buf.extend_from_slice(name.as_bytes());
        self.buf.extend_from_slice(data);

        self.entries.push(EntryRecord {
            name: name.to_string(),
            crc32,
            size,
            local_header_offset,
        });
    }

    /// 写出中央目录与 EOCD，返回完整的容器字节列
    pub fn finish(mut self) -> Vec<u8> {
        let cd_offset = self.buf.len() as u32;

        for entry in &self.entries {
            push_u32(&mut self.buf, SIG_CD_ENTRY);
            push_u16(&mut self.buf, VERSION_NEEDED); // version made by
            push_u16(&mut self.buf, VERSION_NEEDED);
            push_u16(&mut self.buf, FLAG_UTF8_NAMES);
            push_u16(&mut self.buf, METHOD_STORED);
            push_u16(&mut self.buf, DOS_TIME);
            push_u16(&mut self.buf, DOS_DATE);
            push_u32(&mut self.buf, entry.crc32);
            push_u32(&mut self.buf, entry.size);
            push_u32(&mut self.buf, entry.size);
            push_u16(&mut self.buf, entry.name.len() as u16);
            push_u16(&mut self.buf, 0); // extra field length
            push_u16(&mut self.buf, 0); // comment length
            push_u16(&mut self.buf, 0); // disk number start
            push_u16(&mut self.buf, 0); // internal attributes
            push_u32(&mut self.buf, 0); // external attributes
            push_u32(&mut self.buf, entry.local_header_offset);
            self.buf.extend_from_slice(entry.name.as_bytes());
        }

        let cd_size = self.buf.len() as u32 - cd_offset;
        let entry_count = self.entries.len() as u16;

        push_u32(&mut self.buf, SIG_EOCD);
        push_u16(&mut self.buf, 0); // disk number
        push_u16(&mut self.buf, 0); // central directory start disk
        push_u16(&mut self.buf, entry_count); // entries on this disk
        push_u16(&mut self.buf, entry_count); // total entries
        push_u32(&mut self.buf, cd_size);
        push_u32(&mut self.buf, cd_offset);
        push_u16(&mut self.buf, 0); // comment length

        self.buf
    }
}

impl Default for ZipArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn push_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_starts_with_local_header_signature() {
        let mut writer = ZipArchiveWriter::new();
        writer.add_entry("mimetype", b"application/epub+zip");
        let bytes = writer.finish();

        assert_eq!(&bytes[..4], &[0x50, 0x4b, 0x03, 0x04]);
    }

    #[test]
    fn test_first_entry_payload_follows_header_and_name() {
        let mut writer = ZipArchiveWriter::new();
        writer.add_entry("mimetype", b"application/epub+zip");
        let bytes = writer.finish();

        // ローカルヘッダ 30 バイト + 名前 8 バイトの直後がデータ
        let payload_start = 30 + "mimetype".len();
        assert_eq!(
            &bytes[payload_start..payload_start + 20],
            b"application/epub+zip"
        );
    }

    #[test]
    fn test_known_crc32_recorded_in_header() {
        let mut writer = ZipArchiveWriter::new();
        writer.add_entry("a.txt", b"abc");
        let bytes = writer.finish();

        // "abc" の CRC-32 は 0x352441C2、ヘッダ先頭から 14 バイト目
        assert_eq!(&bytes[14..18], &0x352441C2u32.to_le_bytes());
    }

    #[test]
    fn test_eocd_carries_entry_count_and_cd_offset() {
        let mut writer = ZipArchiveWriter::new();
        writer.add_entry("mimetype", b"application/epub+zip");
        writer.add_entry("OEBPS/a.xhtml", b"<html />");
        let bytes = writer.finish();

        let eocd = &bytes[bytes.len() - 22..];
        assert_eq!(&eocd[..4], &[0x50, 0x4b, 0x05, 0x06]);
        assert_eq!(u16::from_le_bytes([eocd[10], eocd[11]]), 2); // total entries

        let cd_offset = u32::from_le_bytes([eocd[16], eocd[17], eocd[18], eocd[19]]) as usize;
        assert_eq!(&bytes[cd_offset..cd_offset + 4], &[0x50, 0x4b, 0x01, 0x02]);
    }

    #[test]
    fn test_stored_sizes_match_payload() {
        let mut writer = ZipArchiveWriter::new();
        writer.add_entry("x", b"12345");
        let bytes = writer.finish();

        // compressed / uncompressed とも 5
        assert_eq!(&bytes[18..22], &5u32.to_le_bytes());
        assert_eq!(&bytes[22..26], &5u32.to_le_bytes());
    }
}
