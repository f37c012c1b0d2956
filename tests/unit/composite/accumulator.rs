use super::*;

#[test]
fn zeroed_matches_slice_dims() {
    let acc = Accumulator::zeroed(SliceDims::new(3, 2));
    assert_eq!(acc.dims(), SliceDims::new(3, 2));
    let data = acc.into_data();
    assert_eq!(data.len(), 6);
    assert!(data.iter().all(|&v| v == 0.0));
}

#[test]
fn zeroed_set_allocates_independent_buffers() {
    let mut set = Accumulator::zeroed_set(SliceDims::new(2, 1), 3);
    assert_eq!(set.len(), 3);
    set[1].data_mut()[0] = 5.0;
    assert_eq!(set[0].data_mut()[0], 0.0);
    assert_eq!(set[1].clone().into_data(), vec![5.0, 0.0]);
}
