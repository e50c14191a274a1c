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
use num::Integer;
use crate::util::{ChunkPairIterator, ChunkIteratorConstraits};

/// Tiles a raster of n_rows x n_cols into roughly n_chunks x n_chunks windows,
/// row by row
pub struct RasterChunkIterator<I>
where I: ChunkIteratorConstraits
{
    num_steps: usize,

    x_pair_it: ChunkPairIterator<I>,
    y_pair_it: ChunkPairIterator<I>,
    num_col_chunks: usize,
    cur_step: usize,

    current_y_pair: Option<(I, I)>
}

#[derive(Debug)]
pub struct RasterChunkIteratorItem<I>
where I: ChunkIteratorConstraits
{
    //X, Y  or column, row order
    pub window_size: (I, I),

    pub window_offset: (I, I),

    pub current_step: usize,
    pub num_steps: usize
}

impl<I> RasterChunkIterator<I>
where I: ChunkIteratorConstraits
{
    pub fn new(n_rows: I, n_cols: I, n_chunks: I) -> Self {

        assert!(n_rows > I::zero());
        assert!(n_cols > I::zero());
        assert!(n_chunks > I::zero());

        let y_it = ChunkPairIterator::new(I::zero(), n_rows - I::one(),
                                          Integer::div_ceil(&n_rows, &n_chunks));
        let x_it = ChunkPairIterator::new(I::zero(), n_cols - I::one(),
                                          Integer::div_ceil(&n_cols, &n_chunks));
        let num_col_chunks = x_it.len();

        Self {
            num_steps: y_it.len() * num_col_chunks,
            x_pair_it: x_it,
            y_pair_it: y_it,
            num_col_chunks,
            cur_step: 0,
            current_y_pair: None
        }
    }
}

impl<I> Iterator for RasterChunkIterator<I>
where I: ChunkIteratorConstraits
{
    type Item = RasterChunkIteratorItem<I>;

    fn next(&mut self) -> Option<Self::Item> {

        if self.cur_step >= self.num_steps {
            return None;
        }

        let chunk_col = self.cur_step % self.num_col_chunks;

        if chunk_col == 0 {
            self.current_y_pair = self.y_pair_it.next();
        }

        let y_val = self.current_y_pair?;
        let x_val = self.x_pair_it.next()?;

        if chunk_col == self.num_col_chunks - 1 {
            self.x_pair_it.reset();
        }

        let item = RasterChunkIteratorItem {
            window_size: (I::one() + x_val.1 - x_val.0, I::one() + y_val.1 - y_val.0),
            window_offset: (x_val.0, y_val.0),
            current_step: self.cur_step,
            num_steps: self.num_steps
        };

        self.cur_step += 1;

        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let l = self.num_steps - self.cur_step;
        (l, Some(l))
    }
}

impl<I> ExactSizeIterator for RasterChunkIterator<I>
where I: ChunkIteratorConstraits
{
}
