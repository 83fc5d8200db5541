mod clicker;
mod referral;

const TAPS_PARTIALLY_REJECTED: &str = "Part of taps were rejected by anti-cheat.";
const TAPS_ACCEPTED: &str = "Tap accepted.";
const DAILY_BONUS_CLAIMED: &str = "Daily bonus claimed.";
const LOTTERY_ENTERED: &str = "Lottery entry saved.";

fn referral_applied_message(levels: u32) -> String {
    format!("Referral bonus applied (+{levels} levels for both).")
}
