//! 提示词元数据
//!
//! 元数据只做追加, 不修改图像像素

use std::io::Cursor;

use encoding::{EncoderTrap, Encoding, all::ISO_8859_1};
use png::{Decoder, Encoder, Transformations};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::error::{Error, Result};

/// 写入元数据的版本号
pub const METADATA_VERSION: &str = "1.0";

/// 元数据中的节点标识
pub const METADATA_KEY: &str = "prompt_enhancer";

/// 提示词元数据记录
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub original: String,
    pub enhanced: String,
    pub negative: String,
}

impl MetadataRecord {
    pub fn new(
        original: impl Into<String>,
        enhanced: impl Into<String>,
        negative: impl Into<String>,
    ) -> Self {
        Self {
            original: original.into(),
            enhanced: enhanced.into(),
            negative: negative.into(),
        }
    }

    /// PNG 文本块, 按固定顺序
    pub fn text_chunks(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("original_prompt", self.original.as_str()),
            ("enhanced_prompt", self.enhanced.as_str()),
            ("negative_prompt", self.negative.as_str()),
        ]
    }

    /// 写入 `extra_pnginfo` 的值
    pub fn to_value(&self) -> Value {
        json!({
            "original_prompt": self.original,
            "enhanced_prompt": self.enhanced,
            "negative_prompt": self.negative,
            "version": METADATA_VERSION,
        })
    }
}

/// 合并元数据
///
/// `existing` 解析失败或不是对象时按 `{}` 处理
pub fn merge_metadata(existing: &str, record: &MetadataRecord) -> Value {
    let mut root = match serde_json::from_str::<Value>(existing) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            warn!("metadata is not a json object, starting from an empty one");
            Map::new()
        }
        Err(e) => {
            if !existing.trim().is_empty() {
                warn!("invalid metadata json, starting from an empty one: {e}");
            }
            Map::new()
        }
    };

    root.insert(
        "prompt".to_string(),
        json!({
            "enhanced": record.enhanced,
            "original": record.original,
            "negative": record.negative,
        }),
    );

    let mut enhancer = match root.remove(METADATA_KEY) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    enhancer.insert("version".to_string(), json!(METADATA_VERSION));
    root.insert(METADATA_KEY.to_string(), Value::Object(enhancer));

    Value::Object(root)
}

/// 合并元数据并格式化输出
pub fn merge_metadata_pretty(existing: &str, record: &MetadataRecord) -> Result<String> {
    Ok(serde_json::to_string_pretty(&merge_metadata(
        existing, record,
    ))?)
}

/// 是否可以用 ISO-8859-1 表示
fn is_latin1(text: &str) -> bool {
    ISO_8859_1.encode(text, EncoderTrap::Strict).is_ok()
}

/// 文本块
enum TextChunk {
    Latin1 { keyword: String, text: String },
    Compressed { keyword: String, text: String },
    Utf8 { keyword: String, text: String },
}

impl TextChunk {
    fn keyword(&self) -> &str {
        match self {
            TextChunk::Latin1 { keyword, .. }
            | TextChunk::Compressed { keyword, .. }
            | TextChunk::Utf8 { keyword, .. } => keyword,
        }
    }

    fn from_record(keyword: &str, text: &str) -> Self {
        if is_latin1(text) {
            TextChunk::Latin1 {
                keyword: keyword.to_string(),
                text: text.to_string(),
            }
        } else {
            TextChunk::Utf8 {
                keyword: keyword.to_string(),
                text: text.to_string(),
            }
        }
    }

    fn write<W: std::io::Write>(self, encoder: &mut Encoder<'_, W>) -> Result<()> {
        match self {
            TextChunk::Latin1 { keyword, text } => encoder.add_text_chunk(keyword, text)?,
            TextChunk::Compressed { keyword, text } => encoder.add_ztxt_chunk(keyword, text)?,
            TextChunk::Utf8 { keyword, text } => encoder.add_itxt_chunk(keyword, text)?,
        }
        Ok(())
    }
}

/// 在 PNG 中写入提示词文本块
///
/// 像素数据与色彩相关的辅助块原样写回; 已有的同名文本块会被替换, 其他文本块保留
pub fn embed_png_text(png_bytes: &[u8], record: &MetadataRecord) -> Result<Vec<u8>> {
    let mut decoder = Decoder::new(Cursor::new(png_bytes));
    decoder.set_transformations(Transformations::IDENTITY);
    let mut reader = decoder.read_info()?;

    if reader.info().animation_control.is_some() {
        return Err(Error::UnsupportedImage(
            "animated png is not supported".to_string(),
        ));
    }

    let mut buffer = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buffer)?;
    buffer.truncate(frame.buffer_size());

    let info = reader.info();
    let replaced: Vec<&str> = record.text_chunks().iter().map(|(k, _)| *k).collect();

    let mut chunks = Vec::new();
    for chunk in &info.uncompressed_latin1_text {
        chunks.push(TextChunk::Latin1 {
            keyword: chunk.keyword.clone(),
            text: chunk.text.clone(),
        });
    }
    for chunk in &info.compressed_latin1_text {
        chunks.push(TextChunk::Compressed {
            keyword: chunk.keyword.clone(),
            text: chunk.get_text()?,
        });
    }
    for chunk in &info.utf8_text {
        chunks.push(TextChunk::Utf8 {
            keyword: chunk.keyword.clone(),
            text: chunk.get_text()?,
        });
    }
    chunks.retain(|chunk| !replaced.contains(&chunk.keyword()));
    for (keyword, text) in record.text_chunks() {
        chunks.push(TextChunk::from_record(keyword, text));
    }

    // 保留 gAMA/cHRM/sRGB/iCCP/pHYs/eXIf 等辅助块, 文本块重新写入
    let mut info = info.clone();
    info.uncompressed_latin1_text.clear();
    info.compressed_latin1_text.clear();
    info.utf8_text.clear();
    // 解码后的像素已去隔行
    info.interlaced = false;

    let mut output = Vec::with_capacity(png_bytes.len() + 1024);
    {
        let mut encoder = Encoder::with_info(&mut output, info)?;
        for chunk in chunks {
            chunk.write(&mut encoder)?;
        }

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&buffer)?;
        writer.finish()?;
    }

    Ok(output)
}
