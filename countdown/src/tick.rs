/// One countdown value, always within `0..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tick(u8);

impl Tick {
    /// The first value of every run.
    pub const FIRST: Tick = Tick(10);

    /// The last value of every run.
    pub const LAST: Tick = Tick(0);

    /// Number of ticks in a run, both ends included.
    pub const COUNT: usize = Self::FIRST.0 as usize + 1;

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::FIRST.0).then_some(Self(value))
    }

    /// The tick emitted at 0-based position `index` of a run.
    pub fn from_index(index: u64) -> Option<Self> {
        u8::try_from(index)
            .ok()
            .and_then(|i| Self::FIRST.0.checked_sub(i))
            .map(Self)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// The tick that follows this one, or `None` after [`Tick::LAST`].
    pub fn next(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }

    /// Lazily yields `10, 9, ..., 0`.
    pub fn sequence() -> impl Iterator<Item = Tick> {
        core::iter::successors(Some(Self::FIRST), |t| t.next())
    }
}

impl core::fmt::Display for Tick {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Tick> for u8 {
    fn from(value: Tick) -> Self {
        value.0
    }
}
