/*
This file is part of the NDVI Tools
Copyright (C) 2022 Novel-T

The NDVI Tools are free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/
use std::fmt::Debug;
use num::{FromPrimitive, Integer, PrimInt};

// See the tests for examples

pub trait ChunkIteratorConstraits: PrimInt + Integer + FromPrimitive + Debug
{
}

impl<T: PrimInt + Integer + FromPrimitive + Debug> ChunkIteratorConstraits for T {}

/// Yields start, start + step, start + 2*step, ... and always finishes on end
pub struct ChunkIterator<I>
where I: ChunkIteratorConstraits
{
    start: I,
    end: I,
    step_size: I,
    num_steps: usize,
    cur_step: usize,
}

impl<I> ChunkIterator<I>
where I: ChunkIteratorConstraits
{
    ///
    /// Inclusive [start, end]
    pub fn new(start: I, end: I, step_size: I) -> Self {

        assert!(end >= start);
        assert!(step_size >= I::one());

        let (full_steps, rest) = (end - start).div_rem(&step_size);
        let num_steps = if rest > I::zero() {
            full_steps + I::one() + I::one()
        } else {
            full_steps + I::one()
        };

        ChunkIterator {
            start,
            end,
            step_size,
            num_steps: num_steps.to_usize().unwrap_or(0),
            cur_step: 0,
        }
    }

    fn value_at(&self, step: usize) -> I {
        if step + 1 >= self.num_steps {
            return self.end;
        }

        self.start + self.step_size * I::from_usize(step).unwrap_or_else(I::zero)
    }

    fn go_back(&mut self) {
        self.cur_step = self.cur_step.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        self.cur_step = 0;
    }
}

impl<I> Iterator for ChunkIterator<I>
where I: ChunkIteratorConstraits
{
    type Item = I;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur_step >= self.num_steps {
            return None;
        }

        let value = self.value_at(self.cur_step);
        self.cur_step += 1;

        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let l = self.num_steps - self.cur_step;
        (l, Some(l))
    }
}

impl<I> ExactSizeIterator for ChunkIterator<I>
where I: ChunkIteratorConstraits
{
}

/// Splits an inclusive range into consecutive inclusive (lower, upper) pairs
pub struct ChunkPairIterator<I>
where I: ChunkIteratorConstraits
{
    chunk_iter: ChunkIterator<I>,
}

impl<I> ChunkPairIterator<I>
where I: ChunkIteratorConstraits
{
    ///
    /// Start and end are inclusive
    pub fn new(start: I, end: I, step_size: I) -> Self {

        let chunk_iter = ChunkIterator::new(start, end + I::one(), step_size);

        //at least 2 boundaries since the end was pushed out by one
        assert!(chunk_iter.len() > 1);

        ChunkPairIterator {
            chunk_iter,
        }
    }

    pub fn reset(&mut self) {
        self.chunk_iter.reset();
    }
}

impl<I> Iterator for ChunkPairIterator<I>
where I: ChunkIteratorConstraits
{
    type Item = (I, I);

    fn next(&mut self) -> Option<Self::Item> {
        let lower = self.chunk_iter.next()?;
        let upper_exclusive = self.chunk_iter.next()?;

        //the upper boundary is the next lower boundary
        self.chunk_iter.go_back();

        Some((lower, upper_exclusive - I::one()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let l = self.chunk_iter.len().saturating_sub(1);
        (l, Some(l))
    }
}

impl<I> ExactSizeIterator for ChunkPairIterator<I>
where I: ChunkIteratorConstraits
{
}
