use super::*;

/// Deterministic, aperiodic text with no sentence boundaries
fn unbroken_text() -> String {
    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    (0..2500)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            char::from(b'a' + u8::try_from((state >> 33) % 26).unwrap_or(0))
        })
        .collect()
}

#[test]
fn short_text_returned_unchanged() {
    let text = "A short paragraph about nothing in particular.";
    let chunks = chunk_text(text, 1000, 200);

    assert_eq!(chunks, vec![text.to_string()]);
}

#[test]
fn empty_input_yields_no_chunks() {
    assert!(chunk_text("", 1000, 200).is_empty());
}

#[test]
fn whitespace_only_windows_are_dropped() {
    let text = " ".repeat(1500);
    assert!(chunk_text(&text, 1000, 200).is_empty());
}

#[test]
fn sliding_window_scenario() {
    let text = unbroken_text();
    let chunks = chunk_text(&text, 1000, 200);

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].chars().count(), 1000);
    assert_eq!(chunks[1].chars().count(), 1000);
    assert_eq!(chunks[2].chars().count(), 900);

    // Consecutive chunks share the configured overlap
    for pair in chunks.windows(2) {
        let prev: Vec<char> = pair[0].chars().collect();
        let next: Vec<char> = pair[1].chars().collect();
        assert_eq!(prev[prev.len() - 200..], next[..200]);
    }
}

#[test]
fn chunks_cover_every_source_character() {
    let text = unbroken_text();
    let chunks = chunk_text(&text, 1000, 200);

    let mut covered = vec![false; text.chars().count()];
    let source: Vec<char> = text.chars().collect();
    let mut search_from = 0;

    for chunk in &chunks {
        let chunk_chars: Vec<char> = chunk.chars().collect();
        let start = (search_from..=source.len() - chunk_chars.len())
            .find(|&i| source[i..i + chunk_chars.len()] == chunk_chars[..])
            .expect("chunk should appear in the source");
        for flag in &mut covered[start..start + chunk_chars.len()] {
            *flag = true;
        }
        search_from = start;
    }

    assert!(covered.iter().all(|&c| c), "every character must be covered");
}

#[test]
fn terminates_when_overlap_exceeds_chunk_size() {
    let text = "x".repeat(200);
    let chunks = chunk_text(&text, 10, 20);

    assert!(!chunks.is_empty());
    assert!(chunks.iter().all(|c| !c.is_empty()));
    // Forward progress floor means at most one chunk per character
    assert!(chunks.len() <= 200);
}

#[test]
fn snaps_to_sentence_boundary_in_second_half() {
    let mut text = "a".repeat(900);
    text.push('.');
    text.push_str(&"b".repeat(600));

    let chunks = chunk_text(&text, 1000, 200);

    // The boundary at index 900 falls past the window midpoint, so the
    // first chunk ends just after the period.
    assert_eq!(chunks[0].chars().count(), 901);
    assert!(chunks[0].ends_with('.'));
}

#[test]
fn ignores_sentence_boundary_before_window_midpoint() {
    let mut text = "a".repeat(300);
    text.push('.');
    text.push_str(&"b".repeat(1500));

    let chunks = chunk_text(&text, 1000, 200);

    assert_eq!(chunks[0].chars().count(), 1000);
}

#[test]
fn deterministic_for_same_input() {
    let text = unbroken_text();
    assert_eq!(chunk_text(&text, 1000, 200), chunk_text(&text, 1000, 200));
}

#[test]
fn config_defaults_match_pipeline_defaults() {
    let config = ChunkingConfig::default();
    assert_eq!(config.chunk_size, 1000);
    assert_eq!(config.overlap, 200);

    let text = unbroken_text();
    assert_eq!(
        chunk_with_config(&text, &config),
        chunk_text(&text, 1000, 200)
    );
}
