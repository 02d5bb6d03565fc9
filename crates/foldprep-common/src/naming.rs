//! Filesystem-safe names and chain-id labels.
//!
//! Every job name and chain id that ends up in a file path goes through
//! `sanitised_name` exactly once, at sample-sheet normalization time.
//! Downstream derivations (`{job}_chain-{id}`, `{job}_seed-{s}`) only append
//! characters that are already in the safe set.

/// Lowercase, spaces to underscores, then strip anything outside
/// `[a-z0-9_.-]`. The result is safe as a file name on all platforms the
/// batch scheduler runs on.
pub fn sanitised_name(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '.'))
        .collect()
}

/// Chain label for a zero-based index: A..Z, then AA..AZ, BA.., ZZ, AAA, …
///
/// Pure function of the index; combined jobs relabel their chains by
/// enumeration order so two runs over the same sheet assign identical ids.
pub fn chain_label(index: usize) -> String {
    let mut n = index + 1; // bijective base-26
    let mut buf = Vec::new();
    while n > 0 {
        n -= 1;
        buf.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    buf.reverse();
    String::from_utf8(buf).expect("ASCII labels")
}
