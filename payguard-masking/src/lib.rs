//! One-way PII masking for PayGuard.
//!
//! Used immediately before a record is serialized for an external audience
//! (analytics export, logs). Masking is not encryption: there is no way back
//! from a masked value, and masked records must never be written to storage
//! in place of the encrypted originals.

mod mask;

pub use mask::{
    is_sensitive_field, mask, mask_in_place, mask_json_in_place, masked_copy, MASK_TOKEN,
    SENSITIVE_MARKERS, VISIBLE_SUFFIX,
};
