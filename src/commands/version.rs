use std::env;

use crate::app_info::AppInfo;

pub fn print_version_info() {
    for line in version_report(AppInfo::current()) {
        println!("{line}");
    }
}

fn version_report(app: AppInfo) -> Vec<String> {
    let mut lines = vec![format!("📦 {}", app.user_agent())];

    if !app.description.is_empty() {
        lines.push(format!("📝 {}", app.description));
    }

    lines.push(format!("🔗 Git Hash: {}", option_env!("GIT_HASH").unwrap_or("unknown")));
    lines.push(format!("🖥️  Platform: {}/{}", env::consts::OS, env::consts::ARCH));

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_report_leads_with_user_agent() {
        let report = version_report(AppInfo::new("credential-reset", "1.2.3", ""));

        assert_eq!(report[0], "📦 credential-reset/1.2.3");
        assert!(!report.iter().any(|line| line.starts_with("📝")));
        assert!(report.iter().any(|line| line.contains(env::consts::OS)));
    }
}
