use rand::Rng;
use serde::Serialize;

use crate::constants::{BOX_ART_HEIGHT, BOX_ART_WIDTH};
use crate::games::rank::RankedGame;
use crate::games::{GameErr, GameResult};

/// Fills the `{width}` and `{height}` placeholders of a helix image template.
///
/// Only the first occurrence of each literal placeholder is replaced; everything else in the
/// template is kept as is.
pub fn render_image_url(template: &str, width: u32, height: u32) -> String {
    template
        .replacen("{width}", &width.to_string(), 1)
        .replacen("{height}", &height.to_string(), 1)
}

/// A game as shown on one side of the comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameCard {
    pub id: String,
    pub name: String,
    pub image: String,
    pub viewers: u64,
}

impl GameCard {
    pub fn new(game: &RankedGame, width: u32, height: u32) -> Self {
        Self {
            id: game.id.clone(),
            name: game.name.clone(),
            image: render_image_url(&game.box_art_url, width, height),
            viewers: game.viewers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GamePair {
    pub game1: GameCard,
    pub game2: GameCard,
}

/// Two distinct candidates, labelled in draw order
#[derive(Debug, Clone, Copy)]
pub struct Sampled<'a> {
    pub first: &'a RankedGame,
    pub second: &'a RankedGame,
}

/// Draws an ordered pair of distinct candidates uniformly at random.
///
/// The second draw is taken from the `n - 1` positions left after the first, with the last
/// position standing in for the one already taken, so exactly two draws are made.
pub fn sample<'a, R>(candidates: &'a [RankedGame], rng: &mut R) -> GameResult<Sampled<'a>>
where
    R: Rng + ?Sized,
{
    let n = candidates.len();
    if n < 2 {
        return Err(GameErr::InsufficientCandidates { found: n });
    }

    let first = rng.random_range(0..n);
    let mut second = rng.random_range(0..n - 1);
    if second == first {
        second = n - 1;
    }

    Ok(Sampled {
        first: &candidates[first],
        second: &candidates[second],
    })
}

/// Samples a pair and renders both box arts at the card size.
pub fn game_pair<R>(candidates: &[RankedGame], rng: &mut R) -> GameResult<GamePair>
where
    R: Rng + ?Sized,
{
    let Sampled { first, second } = sample(candidates, rng)?;

    Ok(GamePair {
        game1: GameCard::new(first, BOX_ART_WIDTH, BOX_ART_HEIGHT),
        game2: GameCard::new(second, BOX_ART_WIDTH, BOX_ART_HEIGHT),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn ranked(id: &str, viewers: u64) -> RankedGame {
        RankedGame {
            id: id.to_string(),
            name: format!("Game {id}"),
            box_art_url: format!("https://art/{id}-{{width}}x{{height}}.jpg"),
            viewers,
        }
    }

    #[test]
    fn test_render_image_url() {
        assert_eq!(
            render_image_url("https://x/{width}x{height}.jpg", 272, 380),
            "https://x/272x380.jpg"
        );
        assert_eq!(
            render_image_url("https://x/{w}-{width}/{HEIGHT}.jpg", 1, 2),
            "https://x/{w}-1/{HEIGHT}.jpg"
        );
    }

    #[test]
    fn test_render_image_url_first_placeholder_only() {
        assert_eq!(
            render_image_url("https://x/{width}x{height}/{width}.jpg", 400, 225),
            "https://x/400x225/{width}.jpg"
        );
    }

    #[test]
    fn test_two_candidates_always_distinct() {
        let candidates = vec![ranked("a", 1), ranked("b", 2)];
        let mut rng = StdRng::seed_from_u64(7);
        let mut orders = HashSet::new();

        for _ in 0..200 {
            let pair = sample(&candidates, &mut rng).unwrap();
            assert_ne!(pair.first.id, pair.second.id);
            orders.insert((pair.first.id.clone(), pair.second.id.clone()));
        }

        assert_eq!(orders.len(), 2);
    }

    #[test]
    fn test_every_ordered_pair_reachable() {
        let candidates = vec![ranked("a", 1), ranked("b", 2), ranked("c", 3)];
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = HashSet::new();

        for _ in 0..500 {
            let pair = sample(&candidates, &mut rng).unwrap();
            assert_ne!(pair.first.id, pair.second.id);
            seen.insert((pair.first.id.clone(), pair.second.id.clone()));
        }

        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn test_too_few_candidates() {
        let mut rng = StdRng::seed_from_u64(1);

        assert!(matches!(
            sample(&[], &mut rng),
            Err(GameErr::InsufficientCandidates { found: 0 })
        ));
        assert!(matches!(
            sample(&[ranked("a", 1)], &mut rng),
            Err(GameErr::InsufficientCandidates { found: 1 })
        ));
    }

    #[test]
    fn test_game_pair_renders_box_art() {
        let candidates = vec![ranked("a", 10), ranked("b", 20)];
        let pair = game_pair(&candidates, &mut StdRng::seed_from_u64(3)).unwrap();

        for card in [&pair.game1, &pair.game2] {
            assert_eq!(card.image, format!("https://art/{}-272x380.jpg", card.id));
        }
        assert_ne!(pair.game1.id, pair.game2.id);
    }
}
