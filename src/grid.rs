use crate::particle::Particle;
use diffusion_common::{SimParams, Vec2};
use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};

/// Uniform spatial hash over the simulation box.
///
/// Buckets are stored CSR-style: `cell_starts[c]..cell_starts[c] +
/// cell_counts[c]` indexes into `cell_particles`, a list of particle
/// indices grouped by cell. The grid is rebuilt from scratch once per tick
/// and is stale as soon as particles move; every consumer within a tick
/// reads the buckets from rebuild time.
pub struct SpatialGrid {
    dim_x: u32,
    dim_y: u32,
    inv_cell_size: f64,
    /// Grid cell index for each particle, assigned in parallel.
    particle_cells: Vec<u32>,
    /// Number of particles in each grid cell.
    cell_counts: Vec<u32>,
    /// Start index in `cell_particles` for each grid cell (prefix sum).
    cell_starts: Vec<u32>,
    /// Particle indices sorted by grid cell.
    cell_particles: Vec<u32>,
    /// Temporary atomic counters tracking write offsets per cell during the
    /// parallel scatter phase.
    write_offsets: Vec<AtomicU32>,
}

impl SpatialGrid {
    pub fn new(params: &SimParams) -> Self {
        let num_cells = params.num_grid_cells as usize;
        SpatialGrid {
            dim_x: params.grid_dim_x,
            dim_y: params.grid_dim_y,
            inv_cell_size: params.inv_cell_size,
            particle_cells: Vec::new(),
            cell_counts: vec![0; num_cells],
            cell_starts: vec![0; num_cells],
            cell_particles: Vec::new(),
            write_offsets: (0..num_cells).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    /// Clears and reassigns every particle to the bucket matching its
    /// current position.
    pub fn rebuild(&mut self, particles: &[Particle]) {
        let num_particles = particles.len();
        self.particle_cells.resize(num_particles, 0);
        self.cell_particles.resize(num_particles, 0);

        // Phase 1: assign cell indices to each particle (parallel). Border
        // positions are clamped into the outermost cells.
        let dim_x = self.dim_x;
        let dim_y = self.dim_y;
        let inv_cell_size = self.inv_cell_size;
        self.particle_cells
            .par_iter_mut()
            .zip(particles.par_iter())
            .for_each(|(cell_out, p)| {
                let grid_x = ((p.pos.x * inv_cell_size).floor() as i64).clamp(0, dim_x as i64 - 1);
                let grid_y = ((p.pos.y * inv_cell_size).floor() as i64).clamp(0, dim_y as i64 - 1);
                *cell_out = grid_y as u32 * dim_x + grid_x as u32;
            });

        // Phase 2: count particles per cell (serial).
        self.cell_counts.iter_mut().for_each(|c| *c = 0);
        for &cell in &self.particle_cells {
            self.cell_counts[cell as usize] += 1;
        }

        // Phase 3: prefix sum over counts to get cell start offsets (serial).
        let mut total = 0u32;
        for (start, count) in self.cell_starts.iter_mut().zip(self.cell_counts.iter()) {
            *start = total;
            total += count;
        }

        // Phase 4: scatter particle indices into their cell blocks. Write
        // positions are claimed atomically per cell, then applied serially.
        self.write_offsets
            .par_iter()
            .for_each(|offset| offset.store(0, Ordering::Relaxed));

        let particle_cells = &self.particle_cells;
        let cell_starts = &self.cell_starts;
        let write_offsets = &self.write_offsets;
        let writes: Vec<(u32, u32)> = (0..num_particles)
            .into_par_iter()
            .map(|idx| {
                let cell = particle_cells[idx] as usize;
                let offset_in_cell = write_offsets[cell].fetch_add(1, Ordering::Relaxed);
                (cell_starts[cell] + offset_in_cell, idx as u32)
            })
            .collect();

        for (slot, particle_idx) in writes {
            self.cell_particles[slot as usize] = particle_idx;
        }
    }

    /// Calls `f` with the index of every particle bucketed in the 3x3 cell
    /// neighborhood around `pos`, excluding `particle_idx` itself. No
    /// distance filter is applied; the caller owns the narrow phase.
    ///
    /// Complete for pairs within collision distance as long as the cell
    /// size is at least twice the particle radius.
    pub fn for_each_candidate<F>(&self, particle_idx: usize, pos: Vec2, mut f: F)
    where
        F: FnMut(usize),
    {
        let center_x = (pos.x * self.inv_cell_size).floor() as i64;
        let center_y = (pos.y * self.inv_cell_size).floor() as i64;

        for dy in -1..=1i64 {
            for dx in -1..=1i64 {
                let grid_x = center_x + dx;
                let grid_y = center_y + dy;
                if grid_x < 0
                    || grid_x >= self.dim_x as i64
                    || grid_y < 0
                    || grid_y >= self.dim_y as i64
                {
                    continue;
                }
                let cell = (grid_y as u32 * self.dim_x + grid_x as u32) as usize;
                let start = self.cell_starts[cell] as usize;
                let end = start + self.cell_counts[cell] as usize;
                for &neighbor_idx in &self.cell_particles[start..end] {
                    if neighbor_idx as usize != particle_idx {
                        f(neighbor_idx as usize);
                    }
                }
            }
        }
    }

    #[cfg(test)]
    fn bucketed_count(&self) -> u32 {
        self.cell_counts.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diffusion_common::SimulationConfig;
    use rand::prelude::*;

    fn test_params() -> SimParams {
        SimulationConfig::default().get_sim_params()
    }

    fn particle_at(x: f64, y: f64) -> Particle {
        Particle::new(Vec2::new(x, y), 2.0, 1.0)
    }

    #[test]
    fn rebuild_buckets_every_particle_once() {
        let params = test_params();
        let mut grid = SpatialGrid::new(&params);
        let mut rng = StdRng::seed_from_u64(7);
        let particles: Vec<Particle> = (0..100)
            .map(|_| {
                particle_at(
                    rng.random_range(0.0..params.world_width),
                    rng.random_range(0.0..params.world_height),
                )
            })
            .collect();
        grid.rebuild(&particles);
        assert_eq!(grid.bucketed_count(), 100);

        // Every particle index appears exactly once in the sorted list
        let mut seen = vec![false; particles.len()];
        for &idx in &grid.cell_particles {
            assert!(!seen[idx as usize], "particle {} bucketed twice", idx);
            seen[idx as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn candidate_query_skips_self() {
        let params = test_params();
        let mut grid = SpatialGrid::new(&params);
        let particles = vec![particle_at(100.0, 100.0), particle_at(101.0, 101.0)];
        grid.rebuild(&particles);

        let mut found = Vec::new();
        grid.for_each_candidate(0, particles[0].pos, |j| found.push(j));
        assert_eq!(found, vec![1]);
    }

    #[test]
    fn neighbor_query_is_complete_within_collision_distance() {
        // Property test: any pair closer than 2x radius (4 units) must see
        // each other through the 3x3 neighborhood, wherever the pair lands
        // relative to cell boundaries.
        let params = test_params();
        let mut grid = SpatialGrid::new(&params);
        let mut rng = StdRng::seed_from_u64(2024);

        for _ in 0..200 {
            let x = rng.random_range(10.0..params.world_width - 10.0);
            let y = rng.random_range(10.0..params.world_height - 10.0);
            let dist = rng.random_range(0.0..4.0);
            let angle = rng.random_range(0.0..std::f64::consts::TAU);
            let particles = vec![
                particle_at(x, y),
                particle_at(x + dist * angle.cos(), y + dist * angle.sin()),
            ];
            grid.rebuild(&particles);

            for (probe, expected) in [(0usize, 1usize), (1, 0)] {
                let mut found = false;
                grid.for_each_candidate(probe, particles[probe].pos, |j| found |= j == expected);
                assert!(
                    found,
                    "pair at distance {} not visible from particle {} at ({}, {})",
                    dist, probe, x, y
                );
            }
        }
    }

    #[test]
    fn border_positions_land_in_outermost_cells() {
        let params = test_params();
        let mut grid = SpatialGrid::new(&params);
        let particles = vec![
            particle_at(0.0, 0.0),
            particle_at(params.world_width, params.world_height),
        ];
        grid.rebuild(&particles);
        assert_eq!(grid.bucketed_count(), 2);
        assert_eq!(grid.particle_cells[0], 0);
        assert_eq!(grid.particle_cells[1], params.num_grid_cells - 1);
    }
}
