/// Modern engines use a gravity formula to update history entries.
/// https://www.chessprogramming.org/History_Heuristic
#[inline(always)]
pub fn apply_gravity(entry: &mut i16, delta: i32, max_value: i32) {
    let h = *entry as i32;
    let b = delta.clamp(-max_value, max_value);
    let new = h + b - ((h * b.abs()) / max_value);
    *entry = new.clamp(-max_value, max_value) as i16;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gravity_saturates_at_max() {
        let mut entry = 0i16;
        for _ in 0..1000 {
            apply_gravity(&mut entry, 400, 512);
        }
        assert!(entry <= 512 && entry > 400);

        for _ in 0..1000 {
            apply_gravity(&mut entry, -400, 512);
        }
        assert!(entry >= -512 && entry < -400);
    }
}
