use resilience_tester::error::AppResult;

fn main() -> AppResult<()> {
    resilience_tester::run()
}
