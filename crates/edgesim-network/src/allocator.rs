//! Equal-share allocation of link capacity.

use crate::config::NetworkConfig;
use crate::locality::Scope;

/// Capacities assigned to a transfer for one progress update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Allocation {
    /// Share of the local link.
    pub lan_bandwidth: f64,
    /// Share of the WAN, zero if the transfer does not use it.
    pub wan_bandwidth: f64,
    /// Whether the transfer uses the WAN.
    pub uses_wan: bool,
    /// Size of the contention group of the transfer.
    pub lan_contenders: usize,
    /// Number of WAN users in the contention group of the transfer.
    pub wan_contenders: usize,
}

impl Allocation {
    /// Capacity the transfer can actually progress with: the narrowest of the links it uses.
    pub fn effective_bandwidth(&self) -> f64 {
        if self.uses_wan {
            self.lan_bandwidth.min(self.wan_bandwidth)
        } else {
            self.lan_bandwidth
        }
    }
}

/// Splits LAN and WAN capacity equally among contending transfers.
///
/// The allocation depends only on the current set of transfers, nothing is carried over between updates.
#[derive(Clone, Copy, Debug)]
pub struct BandwidthAllocator {
    lan_bandwidth: f64,
    wan_bandwidth: f64,
}

impl BandwidthAllocator {
    /// Creates allocator for the links described by the config.
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            lan_bandwidth: config.lan_bandwidth,
            wan_bandwidth: config.wan_bandwidth,
        }
    }

    /// Computes allocations for the given transfers, in the same order.
    ///
    /// Transfers contend within a group connected by shared local links, so a transfer linked to two
    /// otherwise separate transfers brings all three onto one link.
    pub fn allocate(&self, scopes: &[Scope]) -> Vec<Allocation> {
        let groups = contention_groups(scopes);
        let group_count = groups.iter().max().map_or(0, |g| g + 1);
        let mut lan_users = vec![0usize; group_count];
        let mut wan_users = vec![0usize; group_count];
        for (scope, &group) in scopes.iter().zip(groups.iter()) {
            lan_users[group] += 1;
            if scope.uses_wan {
                wan_users[group] += 1;
            }
        }
        scopes
            .iter()
            .zip(groups.iter())
            .map(|(scope, &group)| {
                let lan_contenders = lan_users[group];
                let wan_contenders = wan_users[group];
                let wan_bandwidth = if scope.uses_wan {
                    self.wan_bandwidth / wan_contenders.max(1) as f64
                } else {
                    0.
                };
                Allocation {
                    lan_bandwidth: self.lan_bandwidth / lan_contenders.max(1) as f64,
                    wan_bandwidth,
                    uses_wan: scope.uses_wan,
                    lan_contenders,
                    wan_contenders,
                }
            })
            .collect()
    }
}

/// Labels every transfer with the index of its contention group.
fn contention_groups(scopes: &[Scope]) -> Vec<usize> {
    let mut groups: Vec<Option<usize>> = vec![None; scopes.len()];
    let mut next_group = 0;
    for start in 0..scopes.len() {
        if groups[start].is_some() {
            continue;
        }
        groups[start] = Some(next_group);
        let mut stack = vec![start];
        while let Some(i) = stack.pop() {
            for j in 0..scopes.len() {
                if groups[j].is_none() && scopes[i].shares_local_link(&scopes[j]) {
                    groups[j] = Some(next_group);
                    stack.push(j);
                }
            }
        }
        next_group += 1;
    }
    groups.into_iter().map(|g| g.unwrap_or(0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocator(lan: f64, wan: f64) -> BandwidthAllocator {
        BandwidthAllocator::new(&NetworkConfig {
            lan_bandwidth: lan,
            wan_bandwidth: wan,
            ..NetworkConfig::default()
        })
    }

    fn scope(parties: [usize; 3], uses_wan: bool) -> Scope {
        Scope {
            attachments: parties,
            uses_wan,
        }
    }

    #[test]
    fn single_transfer_gets_full_capacity() {
        let allocations = allocator(100., 20.).allocate(&[scope([0, 0, 1], true)]);
        assert_eq!(allocations[0].lan_bandwidth, 100.);
        assert_eq!(allocations[0].wan_bandwidth, 20.);
        assert_eq!(allocations[0].effective_bandwidth(), 20.);
    }

    #[test]
    fn colocated_transfers_split_lan() {
        let scopes = [
            scope([0, 0, 3], false),
            scope([1, 1, 3], false),
            scope([2, 2, 3], true),
        ];
        let allocations = allocator(100., 30.).allocate(&scopes);
        for allocation in &allocations {
            assert_eq!(allocation.lan_contenders, 3);
            assert!((allocation.lan_bandwidth - 100. / 3.).abs() < 1e-9);
        }
        assert_eq!(allocations[0].wan_bandwidth, 0.);
        assert_eq!(allocations[2].wan_contenders, 1);
        assert_eq!(allocations[2].effective_bandwidth(), 30.);
        let total: f64 = allocations.iter().map(|a| a.lan_bandwidth).sum();
        assert!((total - 100.).abs() < 1e-9);
    }

    #[test]
    fn separate_links_do_not_contend() {
        let scopes = [scope([0, 0, 1], false), scope([2, 2, 3], false)];
        let allocations = allocator(100., 30.).allocate(&scopes);
        assert_eq!(allocations[0].lan_bandwidth, 100.);
        assert_eq!(allocations[1].lan_bandwidth, 100.);
    }

    #[test]
    fn wan_is_split_among_local_wan_users() {
        let scopes = [scope([0, 0, 9], true), scope([1, 1, 9], true), scope([0, 0, 2], false)];
        let allocations = allocator(100., 30.).allocate(&scopes);
        assert_eq!(allocations[0].wan_contenders, 2);
        assert_eq!(allocations[0].wan_bandwidth, 15.);
        assert_eq!(allocations[1].wan_bandwidth, 15.);
        assert_eq!(allocations[2].wan_bandwidth, 0.);
        for allocation in &allocations {
            assert_eq!(allocation.lan_contenders, 3);
        }
    }

    #[test]
    fn chained_transfers_form_one_group() {
        // the middle transfer shares a link with both ends, which share nothing with each other
        let scopes = [scope([1, 1, 10], false), scope([2, 10, 11], false), scope([3, 3, 11], false)];
        assert!(!scopes[0].shares_local_link(&scopes[2]));
        let allocations = allocator(100., 30.).allocate(&scopes);
        for allocation in &allocations {
            assert_eq!(allocation.lan_contenders, 3);
        }
        let total: f64 = allocations.iter().map(|a| a.lan_bandwidth).sum();
        assert!(total <= 100. + 1e-9);
        assert!((total - 100.).abs() < 1e-9);
    }

    #[test]
    fn separate_groups_keep_full_capacity() {
        let scopes = [
            scope([1, 1, 10], true),
            scope([2, 10, 11], false),
            scope([5, 5, 20], true),
            scope([6, 6, 20], false),
        ];
        let allocations = allocator(100., 30.).allocate(&scopes);
        assert_eq!(allocations[0].lan_bandwidth, 50.);
        assert_eq!(allocations[2].lan_bandwidth, 50.);
        assert_eq!(allocations[0].wan_bandwidth, 30.);
        assert_eq!(allocations[2].wan_bandwidth, 30.);
    }

    #[test]
    fn allocation_is_repeatable() {
        let scopes = [scope([0, 0, 9], true), scope([1, 1, 9], false), scope([4, 4, 5], true)];
        let allocator = allocator(100., 30.);
        assert_eq!(allocator.allocate(&scopes), allocator.allocate(&scopes));
    }

    #[test]
    fn empty_snapshot() {
        assert!(allocator(100., 30.).allocate(&[]).is_empty());
    }
}
