use crate::model::Halo;

/// Builds the dense auxiliary arrays a halo catalog needs from a raw friends-of-friends style
/// label array, in two linear passes: `num_in_group`, the compact per-group particle-index
/// list `pglist`, and (optionally) the threaded `head`/`next`/`len`/`tail` structures used by
/// callers that want to walk a group's members without holding onto `pglist` itself.
///
/// A particle with `pfof[i] == 0` belongs to no group and is excluded from every output.
pub struct IndexBuilder;

impl IndexBuilder {
    /// `pfof[i]` is `0` for unbound particles, otherwise the 1-based group id in `[1, num_groups]`.
    pub fn num_in_group(pfof: &[u32], num_groups: usize) -> Vec<u32> {
        let mut counts = vec![0u32; num_groups + 1];
        for &g in pfof {
            if g > 0 {
                counts[g as usize] += 1;
            }
        }
        counts
    }

    /// Per-group particle index lists, in ascending particle-index order — later halo-catalog
    /// consumers rely on this ordering.
    pub fn build_pglist(pfof: &[u32], num_groups: usize) -> Vec<Vec<u32>> {
        let mut num_in_group = Self::num_in_group(pfof, num_groups);
        let mut pglist: Vec<Vec<u32>> = (0..=num_groups).map(|g| Vec::with_capacity(num_in_group[g] as usize)).collect();
        // Reset counts; reused below as a per-group write cursor.
        for c in &mut num_in_group {
            *c = 0;
        }
        for (particle_idx, &g) in pfof.iter().enumerate() {
            if g > 0 {
                pglist[g as usize].push(particle_idx as u32);
            }
        }
        pglist
    }

    /// Assembles [`Halo`] values (1-based group ids become `halo_id`s, to be rewritten later by
    /// [`crate::processes::id_remap::rewrite_halo_ids`]) from a label array. Groups with zero
    /// members are dropped, matching the convention that `pfof == 0` means unbound.
    pub fn build_halos(pfof: &[u32], num_groups: usize) -> Vec<Halo> {
        Self::build_pglist(pfof, num_groups)
            .into_iter()
            .enumerate()
            .skip(1)
            .filter(|(_, indices)| !indices.is_empty())
            .map(|(group_id, indices)| Halo::new(group_id as u64, indices))
            .collect()
    }

    /// The optional threaded-list representation: `head[p]` is the smallest particle index in
    /// `p`'s group, `next[p]` chains to the following member (`u32::MAX` at the tail), `len[p]`
    /// is the group size, and `tail[g]` is the last member of group `g`. Provided as an opt-in
    /// extra pass since the rest of this crate only needs `pglist`/`noffset`.
    pub fn build_threaded_lists(pfof: &[u32], num_groups: usize) -> ThreadedLists {
        let pglist = Self::build_pglist(pfof, num_groups);
        let mut head = vec![u32::MAX; pfof.len()];
        let mut next = vec![u32::MAX; pfof.len()];
        let mut len = vec![0u32; pfof.len()];
        let mut tail = vec![u32::MAX; num_groups + 1];
        for (g, members) in pglist.iter().enumerate().skip(1) {
            if members.is_empty() {
                continue;
            }
            let group_head = members[0];
            for window in members.windows(2) {
                next[window[0] as usize] = window[1];
            }
            for &p in members {
                head[p as usize] = group_head;
                len[p as usize] = members.len() as u32;
            }
            tail[g] = *members.last().unwrap();
        }
        ThreadedLists { head, next, len, tail }
    }
}

/// See [`IndexBuilder::build_threaded_lists`].
pub struct ThreadedLists {
    pub head: Vec<u32>,
    pub next: Vec<u32>,
    pub len: Vec<u32>,
    pub tail: Vec<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excludes_unbound_particles() {
        let pfof = vec![0, 1, 1, 2, 0, 2];
        let counts = IndexBuilder::num_in_group(&pfof, 2);
        assert_eq!(counts, vec![0, 2, 2]);
    }

    #[test]
    fn pglist_is_ascending_particle_index_order() {
        let pfof = vec![2, 1, 2, 1, 0];
        let pglist = IndexBuilder::build_pglist(&pfof, 2);
        assert_eq!(pglist[1], vec![1, 3]);
        assert_eq!(pglist[2], vec![0, 2]);
    }

    #[test]
    fn build_halos_drops_empty_groups() {
        let pfof = vec![1, 1, 3, 3];
        let halos = IndexBuilder::build_halos(&pfof, 3);
        assert_eq!(halos.len(), 2);
        assert_eq!(halos[0].halo_id, 1);
        assert_eq!(halos[1].halo_id, 3);
    }

    #[test]
    fn threaded_lists_chain_group_members() {
        let pfof = vec![1, 1, 1, 2];
        let lists = IndexBuilder::build_threaded_lists(&pfof, 2);
        assert_eq!(lists.head[0], 0);
        assert_eq!(lists.head[2], 0);
        assert_eq!(lists.next[0], 1);
        assert_eq!(lists.next[1], 2);
        assert_eq!(lists.next[2], u32::MAX);
        assert_eq!(lists.len[0], 3);
        assert_eq!(lists.tail[1], 2);
        assert_eq!(lists.tail[2], 3);
    }
}
