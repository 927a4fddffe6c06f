mod determinism_tests;
mod fusion_tests;
