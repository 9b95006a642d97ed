//! Занятость мест секции на конкретном представлении.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Entity, EntityRef, PerformanceKey, Seat, SectionKey};

/// Key of a [`SectionAllocation`]: one grid per performance and section.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SectionAllocationKey {
    pub performance: PerformanceKey,
    pub section: SectionKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("cannot seat {requested} people together in rows of {row_capacity}")]
    ExceedsRowCapacity { requested: usize, row_capacity: usize },

    #[error("not enough free seats in section {section}: requested {requested}, available {available}")]
    NotEnoughSeats {
        section: String,
        requested: usize,
        available: usize,
    },
}

/// Occupancy grid of one section for one performance.
///
/// `allocated[row][seat]` is `true` when the seat is taken. Rows and seats are
/// 0-based here and 1-based in [`Seat`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionAllocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    performance: EntityRef<PerformanceKey>,
    section: EntityRef<SectionKey>,
    allocated: Vec<Vec<bool>>,
    occupied_count: i32,
}

impl SectionAllocation {
    /// Empty grid of `number_of_rows` × `row_capacity` seats. Negative
    /// dimensions count as zero.
    pub fn new(
        performance: EntityRef<PerformanceKey>,
        section: EntityRef<SectionKey>,
        number_of_rows: i32,
        row_capacity: i32,
    ) -> Self {
        let rows = usize::try_from(number_of_rows).unwrap_or(0);
        let per_row = usize::try_from(row_capacity).unwrap_or(0);
        Self {
            id: None,
            performance,
            section,
            allocated: vec![vec![false; per_row]; rows],
            occupied_count: 0,
        }
    }

    /// Rebuilds an allocation loaded from storage.
    pub fn from_parts(
        id: Option<i64>,
        performance: EntityRef<PerformanceKey>,
        section: EntityRef<SectionKey>,
        allocated: Vec<Vec<bool>>,
    ) -> Self {
        let occupied = allocated.iter().flatten().filter(|taken| **taken).count();
        Self {
            id,
            performance,
            section,
            allocated,
            occupied_count: i32::try_from(occupied).unwrap_or(i32::MAX),
        }
    }

    pub fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    pub fn performance(&self) -> &EntityRef<PerformanceKey> {
        &self.performance
    }

    pub fn section(&self) -> &EntityRef<SectionKey> {
        &self.section
    }

    pub fn allocated(&self) -> &[Vec<bool>] {
        &self.allocated
    }

    pub fn occupied_count(&self) -> i32 {
        self.occupied_count
    }

    pub fn total_seats(&self) -> usize {
        self.allocated.iter().map(Vec::len).sum()
    }

    pub fn available_count(&self) -> usize {
        self.allocated.iter().flatten().filter(|taken| !**taken).count()
    }

    fn row_capacity(&self) -> usize {
        self.allocated.first().map_or(0, Vec::len)
    }

    pub fn is_allocated(&self, seat: &Seat) -> bool {
        self.cell(seat).is_some_and(|(row, number)| self.allocated[row][number])
    }

    /// Takes `count` free seats.
    ///
    /// Contiguous requests get the left-most gap of `count` free seats in the
    /// first row that has one. Otherwise free seats are taken in row-major order.
    /// On error nothing is taken.
    pub fn allocate_seats(
        &mut self,
        count: usize,
        contiguous: bool,
    ) -> Result<Vec<Seat>, AllocationError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let row_capacity = self.row_capacity();
        if contiguous && count > row_capacity {
            return Err(AllocationError::ExceedsRowCapacity {
                requested: count,
                row_capacity,
            });
        }

        let picked: Vec<(usize, usize)> = if contiguous {
            self.allocated
                .iter()
                .enumerate()
                .find_map(|(row, seats)| {
                    find_gap(seats, count).map(|start| (start..start + count).map(|n| (row, n)).collect())
                })
                .unwrap_or_default()
        } else {
            self.allocated
                .iter()
                .enumerate()
                .flat_map(|(row, seats)| {
                    seats
                        .iter()
                        .enumerate()
                        .filter(|(_, taken)| !**taken)
                        .map(move |(n, _)| (row, n))
                })
                .take(count)
                .collect()
        };

        if picked.len() < count {
            return Err(AllocationError::NotEnoughSeats {
                section: self.section.key.name.clone(),
                requested: count,
                available: self.available_count(),
            });
        }

        let seats = picked
            .into_iter()
            .map(|(row, number)| {
                self.allocated[row][number] = true;
                Seat::new(self.section.clone(), to_ordinal(row), to_ordinal(number))
            })
            .collect::<Vec<_>>();
        self.occupied_count = self
            .occupied_count
            .saturating_add(i32::try_from(seats.len()).unwrap_or(i32::MAX));
        Ok(seats)
    }

    /// Frees a seat. Freeing a seat that is not taken, or lies outside the
    /// grid, does nothing.
    pub fn deallocate(&mut self, seat: &Seat) {
        if let Some((row, number)) = self.cell(seat) {
            if self.allocated[row][number] {
                self.allocated[row][number] = false;
                self.occupied_count -= 1;
            }
        }
    }

    fn cell(&self, seat: &Seat) -> Option<(usize, usize)> {
        let row = usize::try_from(seat.row_number).ok()?.checked_sub(1)?;
        let number = usize::try_from(seat.number).ok()?.checked_sub(1)?;
        let seats = self.allocated.get(row)?;
        (number < seats.len()).then_some((row, number))
    }
}

/// Start of the left-most run of `len` free seats.
fn find_gap(seats: &[bool], len: usize) -> Option<usize> {
    let mut run = 0;
    for (index, taken) in seats.iter().enumerate() {
        if *taken {
            run = 0;
            continue;
        }
        run += 1;
        if run == len {
            return Some(index + 1 - len);
        }
    }
    None
}

fn to_ordinal(index: usize) -> i32 {
    i32::try_from(index + 1).unwrap_or(i32::MAX)
}

impl Entity for SectionAllocation {
    type Key = SectionAllocationKey;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn natural_key(&self) -> SectionAllocationKey {
        SectionAllocationKey {
            performance: self.performance.key.clone(),
            section: self.section.key.clone(),
        }
    }
}

natural_identity!(SectionAllocation);
