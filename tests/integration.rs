// Aggregator test: include tests from tests/rust/* as distinct modules.
// This keeps sources organized while providing a single integration test
// file that Cargo will compile and run.

mod rust_tests {
    pub mod cli_help {
        include!("rust/cli_help.rs");
    }
    pub mod cli_version {
        include!("rust/cli_version.rs");
    }
    pub mod cli_render {
        include!("rust/cli_render.rs");
    }
    pub mod cli_dry_run {
        include!("rust/cli_dry_run.rs");
    }
    pub mod engine_scenarios {
        include!("rust/engine_scenarios.rs");
    }
}

// Re-export tests so the test runner finds them at crate root.
pub use rust_tests::*;
