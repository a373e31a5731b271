#![allow(dead_code)]

use clonescope_core::config::Environment;
use clonescope_core::extract::Extractor;
use clonescope_core::fingerprint::FingerprintIndex;
use clonescope_core::model::TraversalMode;
use tokio_util::sync::CancellationToken;

/// Four similar C++ functions. When `renamed` is set, the call inside that
/// function targets `adjust` instead of `weigh`.
pub fn cpp_snippet(renamed: Option<usize>) -> String {
    let mut source = String::new();
    for i in 0..4 {
        let callee = if renamed == Some(i) { "adjust" } else { "weigh" };
        source.push_str(&format!(
            "int accumulate{i}(const int *values, int count, int scale) {{\n\
             \x20   int total = {i};\n\
             \x20   for (int k = 0; k < count; ++k) {{\n\
             \x20       if (values[k] > scale) {{\n\
             \x20           total += {callee}(values[k], scale);\n\
             \x20       }} else {{\n\
             \x20           total -= values[k] * {i};\n\
             \x20       }}\n\
             \x20   }}\n\
             \x20   return total;\n\
             }}\n"
        ));
    }
    source
}

/// Line of the `weigh`/`adjust` call in function `index`.
pub fn call_line(index: usize) -> u32 {
    index as u32 * 11 + 5
}

pub fn extractor() -> Extractor {
    clonescope_runtime::build_default_extractor(&Environment::default())
}

pub fn index(
    extractor: &Extractor,
    source: &str,
    mode: TraversalMode,
    window_size: usize,
) -> FingerprintIndex {
    let extraction = extractor
        .extract(source.as_bytes(), Some("cpp"), mode, &CancellationToken::new())
        .unwrap();
    FingerprintIndex::build(&extraction.tree, window_size)
}

pub fn line_extent(index: &FingerprintIndex) -> (u32, u32) {
    let lines = index.lines();
    (
        *lines.iter().min().unwrap(),
        *lines.iter().max().unwrap(),
    )
}
