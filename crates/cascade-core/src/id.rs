use slotmap::new_key_type;

new_key_type! {
    /// Identifies a node (bus, substation, feeder point) in the network graph.
    pub struct NodeId;

    /// Identifies an edge (line segment) in the network graph.
    pub struct EdgeId;
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn node_ids_are_distinct() {
        let mut sm = SlotMap::<NodeId, ()>::with_key();
        let a = sm.insert(());
        let b = sm.insert(());
        assert_ne!(a, b);
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut sm = SlotMap::<NodeId, ()>::with_key();
        let a = sm.insert(());
        let mut map = HashMap::new();
        map.insert(a, "substation");
        assert_eq!(map[&a], "substation");
    }
}
