use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    credential_reset::boot::boot().await
}
