pub(crate) const DEFAULT_USER_AGENT: &str = "DoS-Resilience-Tester/1.0";
pub(crate) const DEFAULT_RUN_NAME: &str = "medium";

pub(crate) fn default_csv_path(run_name: &str) -> String {
    format!("results_{}.csv", run_name)
}
