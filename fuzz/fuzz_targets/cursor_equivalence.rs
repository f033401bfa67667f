#![no_main]

use libfuzzer_sys::fuzz_target;
use ordered_avl::model::CursorEquivalenceInput;

fuzz_target!(|input: CursorEquivalenceInput| {
    ordered_avl::model::run_cursor_equivalence(input.keys, input.ops);
});
