pub const DEFAULT_PARAMETERS: [u32; 4] = [18, 20, 22, 24];

pub const DEFAULT_COMPILER: &str = "gcc";
pub const DEFAULT_SOURCE_DIR: &str = "src";
pub const DEFAULT_BUILD_DIR: &str = "build";
pub const DEFAULT_EXECUTABLE_NAME: &str = "qcs";
pub const DEFAULT_OUTPUT_DIR: &str = "profile";

pub const DEFAULT_HARNESS: &str = "/usr/bin/time";
pub const DEFAULT_HARNESS_ARGS: &str = "-v";
pub const DEFAULT_SAMPLER: &str = "pidstat";
pub const DEFAULT_SAMPLER_ARGS: &str = "-p {pid} {interval}";
pub const DEFAULT_SAMPLE_INTERVAL_SECS: u64 = 1;

pub const DISCOVERY_ATTEMPTS: u32 = 20;
pub const DISCOVERY_INTERVAL_MS: u64 = 100;

pub const SUMMARY_FILE: &str = "benchmark_summary.csv";
pub const TIME_PLOT_FILE: &str = "plot_time_vs_parameter.svg";
pub const RAM_PLOT_FILE: &str = "plot_ram_vs_parameter.svg";
