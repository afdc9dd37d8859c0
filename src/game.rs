use crate::{door_slot, Content, Error, Game, Outcome, Result, Strategy, DOORS};
use rand::Rng;

// 三扇门序号之和，已知两扇门即可得出第三扇
const DOOR_SUM: u32 = 1 + 2 + 3;

/// 随机生成一局游戏
pub fn create_game<R: Rng + ?Sized>(rng: &mut R) -> Game {
    Game::random(rng)
}

/// 挑战者随机选择一扇门，与门后内容无关
pub fn select_door<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(1..=DOORS)
}

/// 主持人打开一扇有山羊的门，返回打开的门序号
///
/// 挑战者选中汽车时，另外两扇门都是山羊，主持人随机打开其中一扇；
/// 否则主持人只能打开既不是挑战者所选、也不是汽车的那一扇。
pub fn open_goat_door<R: Rng + ?Sized>(
    game: &Game,
    initial_pick: u32,
    rng: &mut R,
) -> Result<u32> {
    let opened = match game.content(initial_pick)? {
        Content::Car => random_door(rng, initial_pick),
        Content::Goat => remaining_door(initial_pick, game.car()),
    };
    debug_assert_eq!(game.content(opened), Ok(Content::Goat));
    Ok(opened)
}

/// 挑战者按策略做出最终选择
pub fn change_door(strategy: Strategy, opened_door: u32, initial_pick: u32) -> Result<u32> {
    door_slot(opened_door)?;
    door_slot(initial_pick)?;
    if opened_door == initial_pick {
        return Err(Error::InvalidState(format!(
            "host opened the contestant's door {initial_pick}"
        )));
    }

    match strategy {
        Strategy::Stay => Ok(initial_pick),
        Strategy::Switch => Ok(remaining_door(opened_door, initial_pick)),
    }
}

/// 判断最终选择是否赢得汽车
pub fn determine_winner(final_pick: u32, game: &Game) -> Result<Outcome> {
    match game.content(final_pick)? {
        Content::Car => Ok(Outcome::Win),
        Content::Goat => Ok(Outcome::Lose),
    }
}

// 两扇不同的门之外剩下的那一扇
fn remaining_door(a: u32, b: u32) -> u32 {
    debug_assert!(a != b && a <= DOORS && b <= DOORS, "a = {a}, b = {b}");
    DOOR_SUM - a - b
}

// 在 [1, DOORS] 范围内生成 exclusive 之外的随机门序号
fn random_door<R: Rng + ?Sized>(rng: &mut R, exclusive: u32) -> u32 {
    let random = rng.gen_range(1..DOORS);

    if random >= exclusive {
        random + 1
    } else {
        random
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn random_door_() {
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..100000 {
            let exclusive = rng.gen_range(1..=DOORS);
            let door = random_door(&mut rng, exclusive);
            assert_ne!(door, exclusive);
            assert!((1..=DOORS).contains(&door));
        }
    }

    #[test]
    fn select_door_is_uniform() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut counts = [0u32; DOORS as usize];
        for _ in 0..30000 {
            counts[(select_door(&mut rng) - 1) as usize] += 1;
        }
        for count in counts {
            assert!((count as f64 / 30000.0 - 1.0 / 3.0).abs() < 0.02);
        }
    }

    #[test]
    fn host_opens_the_only_other_goat() {
        let game = Game::new([Content::Car, Content::Goat, Content::Goat]).unwrap();
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..100 {
            assert_eq!(open_goat_door(&game, 2, &mut rng), Ok(3));
            assert_eq!(open_goat_door(&game, 3, &mut rng), Ok(2));
        }
    }

    #[test]
    fn host_picks_either_goat_when_car_chosen() {
        let game = Game::new([Content::Car, Content::Goat, Content::Goat]).unwrap();
        let mut rng = SmallRng::seed_from_u64(4);
        let mut twos = 0;
        for _ in 0..10000 {
            match open_goat_door(&game, 1, &mut rng).unwrap() {
                2 => twos += 1,
                3 => {}
                other => panic!("host opened door {other}"),
            }
        }
        assert!((twos as f64 / 10000.0 - 0.5).abs() < 0.05, "twos = {twos}");
    }

    #[test]
    fn host_rejects_bad_pick() {
        let game = Game::with_car(1).unwrap();
        let mut rng = SmallRng::seed_from_u64(5);
        assert_eq!(
            open_goat_door(&game, 4, &mut rng),
            Err(Error::OutOfRange { door: 4 })
        );
        assert_eq!(
            open_goat_door(&game, 0, &mut rng),
            Err(Error::OutOfRange { door: 0 })
        );
    }

    #[test]
    fn change_door_by_strategy() {
        assert_eq!(change_door(Strategy::Stay, 3, 1), Ok(1));
        assert_eq!(change_door(Strategy::Switch, 3, 1), Ok(2));
        assert_eq!(change_door(Strategy::Switch, 1, 2), Ok(3));
        assert_eq!(change_door(Strategy::Switch, 2, 3), Ok(1));
    }

    #[test]
    fn change_door_errors() {
        assert_eq!(
            change_door(Strategy::Stay, 5, 1),
            Err(Error::OutOfRange { door: 5 })
        );
        assert_eq!(
            change_door(Strategy::Switch, 1, 0),
            Err(Error::OutOfRange { door: 0 })
        );
        assert!(matches!(
            change_door(Strategy::Switch, 2, 2),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(
            change_door(Strategy::Stay, 2, 2),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn winner_holds_the_car() {
        let game = Game::with_car(2).unwrap();
        assert_eq!(determine_winner(2, &game), Ok(Outcome::Win));
        assert_eq!(determine_winner(1, &game), Ok(Outcome::Lose));
        assert_eq!(determine_winner(3, &game), Ok(Outcome::Lose));
        assert_eq!(
            determine_winner(7, &game),
            Err(Error::OutOfRange { door: 7 })
        );
    }
}
