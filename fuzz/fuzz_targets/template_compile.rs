#![no_main]

use libfuzzer_sys::fuzz_target;
use quicktpl_compiler::{compile_with_options, CompileOptions};

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        let options = CompileOptions::default().with_max_depth(16);
        let _ = compile_with_options(Vec::new(), source, "fuzz.qtpl", &options);
    }
});
