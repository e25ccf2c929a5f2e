use super::*;

impl Interpreter {
    fn next_random(&mut self) -> u32 {
        // xorshift32; zero state would stick, so seed is kept nonzero.
        let mut x = self.rng_state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng_state = x;
        x
    }

    /// Uniform integer in `[0, max)`; 0 when the span is degenerate.
    pub(super) fn random_int(&mut self, max: i64) -> i64 {
        if max <= 1 {
            return 0;
        }
        (self.next_random() as i64) % max
    }
}
