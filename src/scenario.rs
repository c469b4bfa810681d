//! Scripted walks through the storage behavior of `DynamicArray`.

use std::fmt;

use anyhow::{Context, Result, anyhow, ensure};
use fsarray::{ArrayError, DynamicArray};
use log::{debug, info};
use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scenario {
    /// Push 0..9 into a default array; no reallocation.
    Push,
    /// Resize the ten-element array to 20.
    Resize,
    /// Erase the element at offset 5.
    Erase,
    /// Insert at the front, the middle and the end.
    Insert,
    /// Ask for an impossible capacity and show nothing changed.
    Failure,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::Push,
        Scenario::Resize,
        Scenario::Erase,
        Scenario::Insert,
        Scenario::Failure,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::Push => "push",
            Scenario::Resize => "resize",
            Scenario::Erase => "erase",
            Scenario::Insert => "insert",
            Scenario::Failure => "failure",
        }
    }
}

/// State of an array after one step of a scenario.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub step: String,
    pub len: usize,
    pub capacity: usize,
    pub contents: Vec<i64>,
}

impl Snapshot {
    fn of(step: impl Into<String>, arr: &DynamicArray<i64>) -> Self {
        let snapshot = Snapshot {
            step: step.into(),
            len: arr.len(),
            capacity: arr.capacity(),
            contents: arr.iter().copied().collect(),
        };
        debug!("{}", snapshot);
        snapshot
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<28} len={:<3} cap={:<3} {:?}",
            self.step, self.len, self.capacity, self.contents
        )
    }
}

fn counted(n: i64) -> DynamicArray<i64> {
    let mut arr = DynamicArray::new();
    for i in 0..n {
        arr.push_back(i);
    }
    arr
}

/// Runs one scenario and returns a snapshot per step.
pub fn run(scenario: Scenario) -> Result<Vec<Snapshot>> {
    info!("running scenario {}", scenario.name());
    let snapshots = match scenario {
        Scenario::Push => push()?,
        Scenario::Resize => resize()?,
        Scenario::Erase => erase()?,
        Scenario::Insert => insert()?,
        Scenario::Failure => failure()?,
    };
    Ok(snapshots)
}

fn push() -> Result<Vec<Snapshot>> {
    let mut arr = DynamicArray::try_new().context("default construction")?;
    let start = Snapshot::of("default", &arr);
    for i in 0..10 {
        arr.try_push_back(i).map_err(|e| anyhow!(e.error))?;
    }
    ensure!(arr.capacity() == start.capacity, "push_back reallocated");
    Ok(vec![start, Snapshot::of("push_back 0..9", &arr)])
}

fn resize() -> Result<Vec<Snapshot>> {
    let mut arr = counted(10);
    let before = Snapshot::of("ten elements", &arr);
    arr.try_resize(20).context("resize to 20")?;
    ensure!(
        arr.as_slice()[..10] == before.contents[..],
        "resize lost elements"
    );
    Ok(vec![before, Snapshot::of("resize(20)", &arr)])
}

fn erase() -> Result<Vec<Snapshot>> {
    let mut arr = counted(10);
    let before = Snapshot::of("ten elements", &arr);
    let next = arr.try_erase(arr.begin() + 5)?;
    let after = Snapshot::of(format!("erase(begin() + 5) -> {}", next), &arr);
    Ok(vec![before, after])
}

fn insert() -> Result<Vec<Snapshot>> {
    let mut arr = counted(3);
    let mut snapshots = vec![Snapshot::of("three elements", &arr)];
    for (label, pos, value) in [
        ("insert(begin(), -1)", arr.begin(), -1),
        ("insert(begin() + 2, 100)", arr.begin() + 2, 100),
    ] {
        arr.try_insert(pos, value).map_err(|e| anyhow!(e.error))?;
        snapshots.push(Snapshot::of(label, &arr));
    }
    let end = arr.end();
    arr.try_insert(end, 99).map_err(|e| anyhow!(e.error))?;
    snapshots.push(Snapshot::of("insert(end(), 99)", &arr));
    Ok(snapshots)
}

fn failure() -> Result<Vec<Snapshot>> {
    let mut arr = counted(4);
    let before = Snapshot::of("four elements", &arr);
    match arr.try_resize(usize::MAX) {
        Err(ArrayError::CapacityOverflow) => info!("resize(usize::MAX) refused"),
        other => return Err(anyhow!("expected a capacity overflow, got {:?}", other)),
    }
    let after = Snapshot::of("after failed resize", &arr);
    ensure!(before.contents == after.contents, "failed resize changed the array");
    ensure!(before.capacity == after.capacity, "failed resize changed capacity");
    Ok(vec![before, after])
}

/// A capacity change seen while pushing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Growth {
    pub len: usize,
    pub capacity: usize,
}

/// Pushes `count` random values and records each capacity change.
pub fn grow_random<R: Rng>(count: usize, rng: &mut R) -> Result<Vec<Growth>> {
    let mut arr: DynamicArray<i64> = DynamicArray::try_new()?;
    let mut growths = vec![Growth {
        len: 0,
        capacity: arr.capacity(),
    }];
    for _ in 0..count {
        arr.try_push_back(rng.random_range(-1000..1000))
            .map_err(|e| anyhow!(e.error))?;
        if arr.capacity() != growths[growths.len() - 1].capacity {
            info!("len {} grew capacity to {}", arr.len(), arr.capacity());
            growths.push(Growth {
                len: arr.len(),
                capacity: arr.capacity(),
            });
        }
    }
    Ok(growths)
}
