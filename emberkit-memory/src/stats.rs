#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AllocStats {
    pub total_bytes: usize,
    pub current_bytes: usize,
    pub successes: usize,
    pub failures: usize,
    pub frees: usize,
    pub null_frees: usize,
}
