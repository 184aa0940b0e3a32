//! Tokenization into padded id/mask tensors.

use candle_core::{Device, Tensor};
use tokenizers::{EncodeInput, Tokenizer};

use crate::error::{KamaeError, Result};

/// A padded batch ready for the encoder.
#[derive(Debug)]
pub struct EncodedBatch {
    /// `[batch, seq]` u32 token ids.
    pub input_ids: Tensor,
    /// `[batch, 1, 1, seq]` u8 mask, 1 at padding positions.
    pub pad_mask: Tensor,
}

/// The tokenizer's padding id, falling back to `[PAD]` and then 0.
pub fn pad_token_id(tokenizer: &Tokenizer) -> u32 {
    tokenizer
        .get_padding()
        .map(|p| p.pad_id)
        .or_else(|| tokenizer.token_to_id("[PAD]"))
        .or_else(|| tokenizer.token_to_id("<pad>"))
        .unwrap_or(0)
}

/// Encodes single texts or `(premise, hypothesis)` pairs and right-pads them.
pub fn encode_batch<'s, I, E>(tokenizer: &Tokenizer, inputs: I, device: &Device) -> Result<EncodedBatch>
where
    I: IntoIterator<Item = E>,
    E: Into<EncodeInput<'s>>,
{
    let encodings = inputs
        .into_iter()
        .map(|input| {
            tokenizer
                .encode(input, true)
                .map_err(|e| KamaeError::Tokenizer(e.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    if encodings.is_empty() {
        return Err(KamaeError::EmptyInput);
    }

    let batch = encodings.len();
    let max_len = encodings.iter().map(|e| e.len()).max().unwrap_or(0).max(1);
    let pad_id = pad_token_id(tokenizer);

    let mut ids = Vec::with_capacity(batch * max_len);
    let mut mask = Vec::with_capacity(batch * max_len);

    for encoding in &encodings {
        let len = encoding.len();
        ids.extend_from_slice(encoding.get_ids());
        ids.resize(ids.len() + (max_len - len), pad_id);
        mask.extend(encoding.get_attention_mask().iter().map(|&m| u8::from(m == 0)));
        mask.resize(mask.len() + (max_len - len), 1u8);
    }

    let input_ids = Tensor::from_vec(ids, (batch, max_len), device)?;
    let pad_mask = Tensor::from_vec(mask, (batch, 1, 1, max_len), device)?;

    Ok(EncodedBatch {
        input_ids,
        pad_mask,
    })
}
