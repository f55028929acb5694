//! Command parsing tests over async sources.

mod pipeline_test;
