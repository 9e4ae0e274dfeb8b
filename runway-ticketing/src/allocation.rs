use std::ops::RangeInclusive;

use rand::Rng;

pub const SEAT_LETTERS: [char; 3] = ['A', 'B', 'C'];
pub const MAX_SEAT_ROW: u8 = 20;
pub const PRICE_RANGE: RangeInclusive<i32> = 19_000..=35_000;

/// Seat label such as `B07`: a letter from `A..=C` and a row from `00..=20`
pub fn draw_seat<R: Rng + ?Sized>(rng: &mut R) -> String {
    let letter = SEAT_LETTERS[rng.gen_range(0..SEAT_LETTERS.len())];
    let row = rng.gen_range(0..=MAX_SEAT_ROW);
    format!("{letter}{row:02}")
}

pub fn draw_price<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    rng.gen_range(PRICE_RANGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn is_valid_seat(seat: &str) -> bool {
        let mut chars = seat.chars();
        let letter_ok = chars.next().is_some_and(|c| SEAT_LETTERS.contains(&c));
        let row: String = chars.collect();
        letter_ok && row.len() == 2 && row.parse::<u8>().is_ok_and(|r| r <= MAX_SEAT_ROW)
    }

    #[test]
    fn test_seats_stay_on_the_seat_map() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = HashSet::new();
        for _ in 0..5_000 {
            let seat = draw_seat(&mut rng);
            assert!(is_valid_seat(&seat), "{seat}");
            seen.insert(seat);
        }
        // 3 letters x 21 rows
        assert_eq!(seen.len(), 63);
    }

    #[test]
    fn test_prices_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..5_000 {
            assert!(PRICE_RANGE.contains(&draw_price(&mut rng)));
        }
    }
}
