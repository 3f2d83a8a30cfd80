pub(crate) use super::*;

#[test]
fn test_from_vec() {
    let m = Matrix::from_vec(2, 3, vec![1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0])
        .expect("test data has correct dimensions: 2*3=6 elements");
    assert_eq!(m.shape(), (2, 3));
    assert!((m.get(0, 0) - 1.0).abs() < 1e-6);
    assert!((m.get(1, 2) - 6.0).abs() < 1e-6);
}

#[test]
fn test_from_vec_error() {
    let result = Matrix::from_vec(2, 3, vec![1.0_f32, 2.0, 3.0]);
    let err = result.expect_err("3 values cannot fill a 2x3 matrix");
    assert!(err.to_string().contains("2x3"));
}

#[test]
fn test_from_rows() {
    let rows = vec![vec![1.0_f32, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
    let m = Matrix::from_rows(2, &rows).expect("rows share a width");
    assert_eq!(m.shape(), (3, 2));
    assert_eq!(m.row(2), &[5.0, 6.0]);
}

#[test]
fn test_from_rows_ragged() {
    let rows = vec![vec![1.0_f32, 2.0], vec![3.0]];
    assert!(Matrix::from_rows(2, &rows).is_err());
}

#[test]
fn test_zeros() {
    let m = Matrix::zeros(2, 3);
    assert_eq!(m.shape(), (2, 3));
    assert!(m.as_slice().iter().all(|&x| x == 0.0));
}

#[test]
fn test_set_then_get() {
    let mut m = Matrix::zeros(2, 2);
    m.set(1, 0, 3.5);
    assert!((m.get(1, 0) - 3.5).abs() < 1e-6);
    assert!((m.get(0, 1) - 0.0).abs() < 1e-6);
}

#[test]
fn test_row() {
    let m = Matrix::from_vec(2, 3, vec![1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0])
        .expect("test data has correct dimensions: 2*3=6 elements");
    let row = m.row(1);
    assert_eq!(row.len(), 3);
    assert!((row[0] - 4.0).abs() < 1e-6);
    assert!((row[2] - 6.0).abs() < 1e-6);
}

#[test]
fn test_rows_iterates_in_order() {
    let m = Matrix::from_vec(3, 1, vec![7.0_f32, 8.0, 9.0]).expect("3x1");
    let firsts: Vec<f32> = m.rows().map(|r| r[0]).collect();
    assert_eq!(firsts, vec![7.0, 8.0, 9.0]);
}

#[test]
fn test_select_rows() {
    let m = Matrix::from_vec(3, 2, vec![0.0_f32, 0.5, 1.0, 1.5, 2.0, 2.5]).expect("3x2");
    let sub = m.select_rows(&[2, 0]).expect("indices in range");
    assert_eq!(sub.shape(), (2, 2));
    assert_eq!(sub.as_slice(), &[2.0, 2.5, 0.0, 0.5]);
}

#[test]
fn test_select_rows_out_of_bounds() {
    let m = Matrix::zeros(2, 2);
    let err = m.select_rows(&[0, 5]).expect_err("row 5 does not exist");
    assert!(err.to_string().contains("index 5"));
}

#[test]
fn test_select_rows_empty() {
    let m = Matrix::zeros(4, 3);
    let sub = m.select_rows(&[]).expect("empty selection is valid");
    assert_eq!(sub.shape(), (0, 3));
}
