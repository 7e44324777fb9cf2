//! Tests for outbound fragmentation and fragment batch helpers.

use rstest::rstest;

use super::support::{SMALL_FRAGMENT_SIZE, message};
use crate::{
    Message,
    fragment::{
        FragmentBatch,
        FragmentIndex,
        FragmentLayout,
        FragmentationError,
        Fragmenter,
        HEADER_LEN,
        MAX_FRAGMENT_SIZE,
        MessageId,
        payload_hash,
    },
};

fn fragmenter() -> Fragmenter { Fragmenter::new(SMALL_FRAGMENT_SIZE).expect("valid size") }

fn body_lengths(batch: &FragmentBatch) -> Vec<usize> {
    batch
        .fragments()
        .iter()
        .map(|fragment| fragment.raw_body().len())
        .collect()
}

#[test]
fn fragmenter_packs_tags_ahead_of_final_chunk() {
    let message = Message::new(MessageId::new(77), vec![0x41; 13]).with_tags(["a", "bb"]);
    let batch = fragmenter().fragment(&message).expect("fragment message");

    assert_eq!(batch.len(), 3);
    assert_eq!(batch.message_id(), MessageId::new(77));
    let fragments = batch.fragments();
    for (position, fragment) in fragments.iter().enumerate() {
        let header = fragment.header();
        assert_eq!(header.fragment_index().as_usize(), position);
        assert_eq!(header.framing().fragment_count, 3);
        assert_eq!(header.framing().nominal_length, 6);
        assert_eq!(header.framing().message_length, 13);
        assert_eq!(header.framing().payload_hash, payload_hash(&[0x41; 13]));
    }
    assert_eq!(fragments[0].raw_body(), &[0x41; 6]);
    assert_eq!(fragments[0].header().tags_length(), 0);
    assert_eq!(fragments[1].raw_body(), &[0x41; 6]);
    assert_eq!(fragments[1].header().tags_length(), 0);
    assert_eq!(fragments[2].raw_body(), b"a\0bbA");
    assert_eq!(fragments[2].header().tags_length(), 4);
}

#[test]
fn fragmenter_fills_final_fragment_on_exact_multiple() {
    let batch = fragmenter()
        .fragment(&message(1, 12, &[]))
        .expect("fragment message");

    assert_eq!(body_lengths(&batch), vec![6, 6]);
    let last = batch.fragments().last().expect("non-empty batch");
    assert_eq!(last.header().tags_length(), 0);
    assert!(last.header().is_last_fragment());
}

#[test]
fn fragmenter_emits_single_empty_fragment_for_empty_message() {
    let batch = fragmenter()
        .fragment(&message(2, 0, &[]))
        .expect("fragment message");

    assert_eq!(batch.len(), 1);
    assert!(!batch.is_fragmented());
    let only = &batch.fragments()[0];
    assert!(only.raw_body().is_empty());
    assert_eq!(only.header().fragment_index(), FragmentIndex::zero());
    assert!(only.header().is_last_fragment());
}

#[test]
fn fragmenter_keeps_tag_block_in_one_fragment_when_it_pushes_the_count() {
    // Five payload bytes plus a six-byte tag block need two fragments; the
    // first takes the whole payload and the last carries only the tags.
    let batch = fragmenter()
        .fragment(&message(3, 5, &["abcdef"]))
        .expect("fragment message");

    assert_eq!(body_lengths(&batch), vec![5, 6]);
    assert_eq!(batch.fragments()[1].raw_body(), b"abcdef");
}

#[rstest]
#[case::single(5, &[], 1)]
#[case::exact_single(6, &[], 1)]
#[case::spill(7, &[], 2)]
#[case::tags_fill_exactly(2, &["abc"], 1)]
#[case::tags_spill(4, &["abc"], 2)]
#[case::tags_only(0, &["a", "b"], 1)]
#[case::large(600, &["x"], 101)]
fn fragment_count_covers_payload_and_tags(
    #[case] len: usize,
    #[case] tags: &[&str],
    #[case] expected: usize,
) {
    let batch = fragmenter()
        .fragment(&message(4, len, tags))
        .expect("fragment message");
    let tags_length = crate::fragment::tags::encoded_len(tags);

    assert_eq!(batch.len(), expected);
    assert_eq!(FragmentLayout::fragment_count_for(len, tags_length, 6), expected);
    assert!(
        batch
            .fragments()
            .iter()
            .all(|fragment| fragment.wire_len() <= SMALL_FRAGMENT_SIZE)
    );
}

#[test]
fn fragmenter_is_deterministic() {
    let message = message(5, 40, &["env=prod", "x"]);
    let first = fragmenter().fragment(&message).expect("fragment message");
    let second = fragmenter().fragment(&message).expect("fragment message");
    assert_eq!(first, second);
    assert_eq!(
        first.datagrams().collect::<Vec<_>>(),
        second.datagrams().collect::<Vec<_>>()
    );
}

#[rstest]
#[case::zero(0)]
#[case::header_only(HEADER_LEN)]
#[case::beyond_length_field(MAX_FRAGMENT_SIZE + 1)]
fn fragmenter_rejects_unusable_sizes(#[case] max_fragment_size: usize) {
    assert_eq!(
        Fragmenter::new(max_fragment_size),
        Err(FragmentationError::Configuration { max_fragment_size })
    );
}

#[rstest]
#[case::one_content_byte(HEADER_LEN + 1, 1)]
#[case::largest(MAX_FRAGMENT_SIZE, u16::MAX)]
fn fragmenter_accepts_boundary_sizes(#[case] max_fragment_size: usize, #[case] nominal: u16) {
    let fragmenter = Fragmenter::new(max_fragment_size).expect("valid size");
    assert_eq!(fragmenter.nominal_length().get(), nominal);
    assert_eq!(fragmenter.max_fragment_size(), max_fragment_size);
}

#[test]
fn fragmenter_rejects_tags_wider_than_a_fragment() {
    let err = fragmenter()
        .fragment(&message(6, 3, &["abc", "def"]))
        .expect_err("seven tag bytes cannot fit six");
    assert_eq!(
        err,
        FragmentationError::TagsTooLarge {
            tags_length: 7,
            nominal_length: 6,
        }
    );
}

#[test]
fn fragmenter_rejects_unencodable_tags() {
    let err = fragmenter()
        .fragment(&message(7, 3, &["ok", ""]))
        .expect_err("empty tag cannot round trip");
    assert_eq!(err, FragmentationError::InvalidTag { position: 1 });
}

#[test]
fn fragmenter_rejects_payloads_needing_too_many_fragments() {
    let tiny = Fragmenter::new(HEADER_LEN + 1).expect("valid size");
    let len = usize::from(u16::MAX) + 1;
    let err = tiny
        .fragment(&message(8, len, &[]))
        .expect_err("count must fit sixteen bits");
    assert_eq!(err, FragmentationError::TooManyFragments { required: len });
}

#[test]
fn fragment_batch_into_iterator_yields_all_fragments() {
    let batch = fragmenter()
        .fragment(&message(9, 13, &[]))
        .expect("fragment message");
    let indices: Vec<u16> = batch
        .into_iter()
        .map(|fragment| fragment.header().fragment_index().get())
        .collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn default_config_matches_documented_limits() {
    use crate::fragment::{
        FragmentationConfig,
        config::{DEFAULT_MAX_FRAGMENT_SIZE, DEFAULT_REASSEMBLY_TIMEOUT},
    };

    let config = FragmentationConfig::default();
    assert_eq!(config.max_fragment_size(), DEFAULT_MAX_FRAGMENT_SIZE);
    assert_eq!(
        config,
        FragmentationConfig::new(DEFAULT_MAX_FRAGMENT_SIZE).expect("valid size")
    );
    assert_eq!(config.reassembly_timeout, DEFAULT_REASSEMBLY_TIMEOUT);
    assert_eq!(config.max_in_flight.get(), 1024);
}
