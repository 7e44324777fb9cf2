//! Shared builders for fragment unit tests.

use std::time::Duration;

use crate::{
    Message,
    fragment::{Fragment, FragmentationConfig, MessageId, Reassembler},
};

/// Wire size giving six content bytes per fragment.
pub const SMALL_FRAGMENT_SIZE: usize = 30;

pub fn config() -> FragmentationConfig {
    FragmentationConfig::new(SMALL_FRAGMENT_SIZE)
        .expect("valid fragment size")
        .with_reassembly_timeout(Duration::from_secs(2))
}

pub fn reassembler() -> Reassembler<u16> { Reassembler::new(&config()) }

pub fn message(id: u32, len: usize, tags: &[&str]) -> Message {
    let payload: Vec<u8> = (0..=u8::MAX).cycle().take(len).collect();
    Message::new(MessageId::new(id), payload).with_tags(tags.iter().copied())
}

pub fn fragments_of(message: &Message) -> Vec<Fragment> {
    config()
        .fragmenter()
        .fragment(message)
        .expect("fragment message")
        .into_fragments()
}
