//! Stream stage tests over async sources.

mod pipeline_test;
