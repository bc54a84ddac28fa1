use std::{fmt::Display, ops::Deref};

/// Always within [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}%", self.0)
    }
}

impl Percentage {
    pub const FULL: Percentage = Percentage(100.);

    /// Part of `width` this percentage covers, rounded down.
    pub fn portion_of(&self, width: usize) -> usize {
        (self.0 / 100. * width as f64).floor() as usize
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// How full the bottle is. Capped at 100 even if the volume somehow got past the goal.
pub fn fill_percentage(volume_ml: u32, goal_ml: u32) -> Percentage {
    if goal_ml == 0 {
        return Percentage::FULL;
    }
    let ratio = f64::from(volume_ml) / f64::from(goal_ml) * 100.;
    Percentage(ratio.min(100.))
}

#[cfg(test)]
mod tests {
    use super::{fill_percentage, Percentage};

    #[test]
    fn test_fill_percentage_half() {
        assert_eq!(*fill_percentage(1000, 2000), 50.);
    }

    #[test]
    fn test_fill_percentage_never_exceeds_full() {
        assert_eq!(fill_percentage(2500, 2000), Percentage::FULL);
        assert_eq!(fill_percentage(2000, 2000), Percentage::FULL);
    }

    #[test]
    fn test_fill_percentage_empty() {
        assert_eq!(*fill_percentage(0, 2000), 0.);
    }

    #[test]
    fn test_portion_of_width() {
        assert_eq!(fill_percentage(250, 2000).portion_of(8), 1);
        assert_eq!(fill_percentage(1999, 2000).portion_of(8), 7);
        assert_eq!(Percentage::FULL.portion_of(8), 8);
    }

    #[test]
    fn test_percentage_display() {
        assert_eq!(fill_percentage(666, 2000).to_string(), "33%");
        assert_eq!(Percentage::FULL.to_string(), "100%");
    }
}
