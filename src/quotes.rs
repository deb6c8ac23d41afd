use crate::models::Timestamp;

const QUOTES: [&str; 10] = [
    "The secret of getting ahead is getting started.",
    "The only way to do great work is to love what you do.",
    "Don't watch the clock; do what it does. Keep going.",
    "Success is not the key to happiness. Happiness is the key to success.",
    "The future depends on what you do today.",
    "Well done is better than well said.",
    "You don't have to be great to start, but you have to start to be great.",
    "The journey of a thousand miles begins with a single step.",
    "Act as if what you do makes a difference. It does.",
    "Focus on being productive instead of busy.",
];

const ROTATION_MS: i64 = 6 * 60 * 60 * 1000;

/// Quote for the six-hour window containing `now`.
pub fn quote_for(now: Timestamp) -> &'static str {
    let window = now.div_euclid(ROTATION_MS);
    QUOTES[window.rem_euclid(QUOTES.len() as i64) as usize]
}
