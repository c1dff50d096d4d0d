// gtsetup-core/src/reboot.rs
use gtsetup_common::config::{Privilege, RebootPolicy};
use tracing::{info, warn};

/// Waits `policy.delay`, then asks the host to restart.
///
/// The request is fire-and-forget: a failing reboot command is logged and
/// otherwise ignored.
pub async fn request_reboot(policy: &RebootPolicy, privilege: Privilege) {
    if !policy.delay.is_zero() {
        info!("Rebooting in {} seconds...", policy.delay.as_secs_f32());
        tokio::time::sleep(policy.delay).await;
    }

    let Some((program, args)) = policy.command.split_first() else {
        warn!("No reboot command configured; reboot manually to apply changes.");
        return;
    };
    info!("Requesting reboot");
    let result = tokio::task::spawn_blocking({
        let program = program.clone();
        let args = args.to_vec();
        move || crate::privilege::run_command(privilege, &program, args.as_slice())
    })
    .await;

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Reboot request failed: {}. Reboot manually to apply changes.", e),
        Err(e) => warn!("Reboot request did not complete: {}", e),
    }
}
