#[cfg(test)]
mod tests {
    use crate::gaussian::MultivariateGaussian;
    use crate::mixture::{EmConfig, GaussianMixture, MixtureSelector};
    use crate::numeric;
    use crate::point::Point;
    use crate::Result;
    use ndarray::{array, Array2};
    use rand::prelude::*;
    use rand_distr::Normal;

    /// `per` unit-variance samples around each centre.
    fn gaussian_blobs(centers: &[[f64; 2]], per: usize, seed: u64) -> Array2<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let mut data = Array2::zeros((centers.len() * per, 2));
        for (i, mut row) in data.outer_iter_mut().enumerate() {
            let c = centers[i / per];
            row[0] = c[0] + noise.sample(&mut rng);
            row[1] = c[1] + noise.sample(&mut rng);
        }
        data
    }

    fn two_clusters_data() -> Array2<f64> {
        gaussian_blobs(&[[-5.0, -5.0], [5.0, 5.0]], 500, 2)
    }

    fn two_clusters() -> Result<GaussianMixture> {
        let data = two_clusters_data();
        MixtureSelector::new()
            .with_diagonal(true)
            .with_seed(7)
            .fit_k(2, &data.view())
    }

    #[test]
    fn test_single_component_recovers_standard_normal() -> Result<()> {
        let data = gaussian_blobs(&[[0.0, 0.0]], 1000, 1);
        let gm = MixtureSelector::new()
            .with_diagonal(true)
            .with_seed(1)
            .fit_k(1, &data.view())?;

        assert_eq!(gm.n_components(), 1);
        let dist = gm.components()[0].distribution();
        for axis in 0..2 {
            assert!(dist.mean()[axis].abs() < 0.1, "mean {}", dist.mean());
            assert!((dist.cov()[[axis, axis]] - 1.0).abs() < 0.2, "cov {}", dist.cov());
        }
        assert!((gm.components()[0].priori() - 1.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_two_separated_clusters() -> Result<()> {
        let gm = two_clusters()?;

        let total: f64 = gm.components().iter().map(|c| c.priori()).sum();
        assert!((total - 1.0).abs() < 1e-6);

        let truth = [array![-5.0, -5.0], array![5.0, 5.0]];
        for c in gm.components() {
            let m = c.distribution().mean();
            let closest = truth
                .iter()
                .map(|t| numeric::squared_distance(&m.view(), &t.view()).sqrt())
                .fold(f64::INFINITY, f64::min);
            assert!(closest < 0.5, "component mean {m} is {closest} from a true centre");
        }
        // One component per cluster.
        assert_ne!(
            gm.predict(&array![-5.0, -5.0].view())?,
            gm.predict(&array![5.0, 5.0].view())?
        );
        Ok(())
    }

    #[test]
    fn test_membership_at_mean_and_far_away() -> Result<()> {
        let gm = two_clusters()?;
        for c in gm.components() {
            let at_mean = Point::from(c.distribution().mean().clone());
            assert!(gm.in_distribution(&at_mean.view(), 0.95)?);

            let sd = c.distribution().cov()[[0, 0]].sqrt();
            let far = Point::new(vec![at_mean.as_slice()[0] + 100.0 * sd, at_mean.as_slice()[1]]);
            assert!(!gm.in_distribution(&far.view(), 0.95)?);
        }
        Ok(())
    }

    #[test]
    fn test_search_finds_three_clusters() -> Result<()> {
        let data = gaussian_blobs(&[[-8.0, 0.0], [8.0, 0.0], [0.0, 10.0]], 100, 3);
        let gm = MixtureSelector::new()
            .with_diagonal(true)
            .with_seed(3)
            .fit(&data.view())?;

        assert_eq!(gm.n_components(), 3);

        // Replay the search's random stream to score each candidate.
        let selector = MixtureSelector::new().with_diagonal(true).with_seed(3);
        let mut rng = StdRng::seed_from_u64(3);
        let mut bics = Vec::new();
        for k in 1..=3 {
            bics.push(selector.fit_candidate(k, &data.view(), &mut rng)?.bic());
        }
        assert!(bics[0] < bics[1] && bics[1] < bics[2], "{bics:?}");
        assert_eq!(gm.bic(), bics[2]);

        // k = 4 either fails numerically or does not improve on k = 3.
        match selector.fit_candidate(4, &data.view(), &mut rng) {
            Ok(four) => assert!(four.bic() <= bics[2]),
            Err(e) => assert!(e.is_numerical(), "{e}"),
        }
        Ok(())
    }

    #[test]
    fn test_posteriori_sums_to_one() -> Result<()> {
        let gm = two_clusters()?;
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..200 {
            let x = array![rng.random_range(-50.0..50.0), rng.random_range(-50.0..50.0)];
            let post = gm.posteriori(&x.view())?;
            assert!((post.sum() - 1.0).abs() < 1e-9);
            assert!(post.iter().all(|p| (0.0..=1.0).contains(p)));
        }
        Ok(())
    }

    #[test]
    fn test_bic_recomputes_from_components() -> Result<()> {
        let gm = two_clusters()?;
        let free: usize = gm.n_components() - 1
            + gm
                .components()
                .iter()
                .map(|c| c.distribution().length())
                .sum::<usize>();
        let expected = gm.log_likelihood() - 0.5 * free as f64 * (gm.n() as f64).ln();
        assert!((gm.bic() - expected).abs() < 1e-9);

        let rebuilt =
            GaussianMixture::with_stats(gm.components().to_vec(), gm.log_likelihood(), gm.n())?;
        assert_eq!(rebuilt.bic(), gm.bic());
        Ok(())
    }

    #[test]
    fn test_snapshot_round_trip() -> Result<()> {
        let gm = two_clusters()?;
        let restored = GaussianMixture::from_params(&gm.to_params())?;
        let probes = [array![0.0, 0.0], array![-5.0, -4.5], array![6.0, 5.5], array![30.0, -2.0]];
        for x in &probes {
            assert_eq!(restored.p(&x.view())?, gm.p(&x.view())?);
            assert_eq!(restored.posteriori(&x.view())?, gm.posteriori(&x.view())?);
        }
        Ok(())
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_snapshot_survives_json() -> Result<()> {
        use crate::mixture::MixtureParams;

        let gm = two_clusters()?;
        let json = serde_json::to_string(&gm.to_params()).unwrap();
        let params: MixtureParams = serde_json::from_str(&json).unwrap();
        let restored = GaussianMixture::from_params(&params)?;
        let x = array![-4.0, -6.0];
        assert_eq!(restored.p(&x.view())?, gm.p(&x.view())?);
        Ok(())
    }

    #[test]
    fn test_tolerance_stops_no_later_than_full_budget() -> Result<()> {
        let data = gaussian_blobs(&[[-3.0, 0.0], [3.0, 0.0]], 150, 8);
        let full = MixtureSelector::new().with_seed(4).fit_k(2, &data.view())?;
        let early = MixtureSelector::new()
            .with_seed(4)
            .with_em(EmConfig::new().with_tolerance(1e-3))
            .fit_k(2, &data.view())?;
        assert!(early.log_likelihood() <= full.log_likelihood() + 1e-6);
        assert!(full.log_likelihood() - early.log_likelihood() < 1.0);
        Ok(())
    }

    #[test]
    fn test_mixture_moments_match_data() -> Result<()> {
        let data = two_clusters_data();
        let gm = MixtureSelector::new().with_seed(7).fit_k(2, &data.view())?;
        let sample_mean = numeric::col_means(&data.view())?;
        let mean = gm.mean();
        assert!((mean[0] - sample_mean[0]).abs() < 0.05);
        assert!((mean[1] - sample_mean[1]).abs() < 0.05);
        // Between-cluster spread dominates: about 25 + 1 per axis.
        let cov = gm.cov();
        assert!((cov[[0, 0]] - 26.0).abs() < 2.0, "{cov}");
        assert!((cov[[0, 1]] - cov[[1, 0]]).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_sampling_from_fitted_mixture() -> Result<()> {
        let gm = two_clusters()?;
        let mut rng = StdRng::seed_from_u64(12);
        let draws = gm.sample_n(4000, &mut rng);
        let refit = MixtureSelector::new().with_seed(5).fit_k(2, &draws.view())?;
        let mut means: Vec<f64> = refit
            .components()
            .iter()
            .map(|c| c.distribution().mean()[0])
            .collect();
        means.sort_by(f64::total_cmp);
        assert!((means[0] + 5.0).abs() < 0.3);
        assert!((means[1] - 5.0).abs() < 0.3);
        Ok(())
    }

    #[test]
    fn test_standardized_features_fit() -> Result<()> {
        // Second feature on a scale 1000x larger.
        let mut data = gaussian_blobs(&[[-4.0, -4.0], [4.0, 4.0]], 100, 6);
        data.column_mut(1).mapv_inplace(|v| v * 1000.0);
        let z = numeric::standardize(&mut data)?;
        assert!(z.sds[1] > 1000.0);

        let gm = MixtureSelector::new().with_seed(6).fit_k(2, &data.view())?;
        for c in gm.components() {
            assert!(c.distribution().mean()[1].abs() < 2.0);
        }
        let a = gm.predict(&data.row(0))?;
        let b = gm.predict(&data.row(199))?;
        assert_ne!(a, b);
        Ok(())
    }

    #[test]
    fn test_cdf_of_fitted_component() -> Result<()> {
        let g = MultivariateGaussian::fit(&two_clusters_data().view(), false)?;
        let mut rng = StdRng::seed_from_u64(31);
        let centre = g.cdf(&g.mean().view(), &mut rng)?;
        // Strong positive correlation between the axes pushes the orthant
        // probability above the independent 1/4.
        assert!(centre > 0.3 && centre < 0.5, "{centre}");
        Ok(())
    }
}
