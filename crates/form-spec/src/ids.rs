use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Fresh field id: `field_<unix-millis>_<9 base36 chars>`.
pub fn new_field_id() -> String {
    generate("field", 9)
}

/// Fresh rule id: `rule_<unix-millis>_<6 base36 chars>`.
pub fn new_rule_id() -> String {
    generate("rule", 6)
}

fn generate(prefix: &str, suffix_len: usize) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..suffix_len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}_{}_{}", prefix, millis, suffix)
}
