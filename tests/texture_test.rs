use castle_viewer::data_structures::texture::fit_to_limit;

#[test]
fn textures_within_the_limit_are_untouched() {
    assert_eq!(fit_to_limit(2048, 2048, 2048), (2048, 2048));
    assert_eq!(fit_to_limit(512, 64, 2048), (512, 64));
}

#[test]
fn oversized_textures_shrink_to_the_limit() {
    assert_eq!(fit_to_limit(4096, 4096, 2048), (2048, 2048));
    assert_eq!(fit_to_limit(8192, 2048, 2048), (2048, 512));
    assert_eq!(fit_to_limit(1000, 3000, 2048), (682, 2048));
}

#[test]
fn thin_textures_keep_at_least_one_texel() {
    assert_eq!(fit_to_limit(10_000, 1, 2048), (2048, 1));
    assert_eq!(fit_to_limit(1, 10_000, 2048), (1, 2048));
}
