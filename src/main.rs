use anyhow::Result;

fn main() -> Result<()> {
    deno_test_migrate::run_cli()
}
