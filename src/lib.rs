mod error;
mod game;
mod simulation;

pub use error::*;
pub use game::*;
pub use simulation::*;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// 门数，只支持三门问题
pub const DOORS: u32 = 3;

/// 门后的内容
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub enum Content {
    /// 汽车（奖品）
    Car,

    /// 山羊
    Goat,
}

/// 一局游戏：三扇门后的内容，有且只有一辆汽车
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
#[serde(try_from = "RawGame")]
pub struct Game {
    doors: [Content; DOORS as usize],
}

// 反序列化时先读成未校验的内容，再经过 `Game::new`
#[derive(Deserialize)]
struct RawGame {
    doors: [Content; DOORS as usize],
}

impl TryFrom<RawGame> for Game {
    type Error = Error;

    fn try_from(raw: RawGame) -> Result<Self> {
        Self::new(raw.doors)
    }
}

impl Game {
    /// 用给定的内容创建游戏，必须恰好有一扇门后是汽车
    pub fn new(doors: [Content; DOORS as usize]) -> Result<Self> {
        let cars = doors.iter().filter(|c| **c == Content::Car).count();
        if cars != 1 {
            return Err(Error::InvalidArgument(format!(
                "a game needs exactly one car, got {cars}"
            )));
        }
        Ok(Self { doors })
    }

    /// 把汽车放到序号指定的门后（序号从 1 开始）
    pub fn with_car(car: u32) -> Result<Self> {
        let slot = door_slot(car)?;
        let mut doors = [Content::Goat; DOORS as usize];
        doors[slot] = Content::Car;
        Ok(Self { doors })
    }

    /// 随机排列一辆汽车和两只山羊
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut doors = [Content::Car, Content::Goat, Content::Goat];
        doors.shuffle(rng);
        Self { doors }
    }

    /// 序号指定的门后的内容
    pub fn content(&self, door: u32) -> Result<Content> {
        Ok(self.doors[door_slot(door)?])
    }

    /// 汽车所在门序号
    pub fn car(&self) -> u32 {
        self.doors
            .iter()
            .position(|c| *c == Content::Car)
            .map_or(0, |slot| slot as u32 + 1)
    }

    pub fn doors(&self) -> &[Content; DOORS as usize] {
        &self.doors
    }
}

/// 挑战者策略
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Strategy {
    /// 坚持选择
    Stay,

    /// 改变选择
    Switch,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::Stay, Strategy::Switch];
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Stay => f.write_str("stay"),
            Strategy::Switch => f.write_str("switch"),
        }
    }
}

/// 一轮游戏的结果
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub enum Outcome {
    Win,
    Lose,
}

impl Outcome {
    pub fn is_win(&self) -> bool {
        matches!(self, Outcome::Win)
    }
}

/// 模拟设置
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// 每种策略模拟的轮数
    pub trials: u32,

    /// 随机数种子，不指定则使用系统熵
    pub seed: Option<u64>,

    /// 是否并行模拟
    pub parallel: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            trials: 2000,
            seed: None,
            parallel: false,
        }
    }
}

impl Settings {
    pub fn new(trials: u32) -> Self {
        Self {
            trials,
            ..Default::default()
        }
    }

    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..self
        }
    }

    pub fn with_parallel(self, parallel: bool) -> Self {
        Self { parallel, ..self }
    }

    /// 某个策略使用的种子。改变选择的一批从 `seed + trials` 开始，
    /// 两批每轮的种子区间不重叠。
    pub fn seed_for(&self, strategy: Strategy) -> Option<u64> {
        self.seed.map(|seed| match strategy {
            Strategy::Stay => seed,
            Strategy::Switch => seed.wrapping_add(u64::from(self.trials)),
        })
    }

    /// 按当前设置模拟一批游戏
    pub fn simulate(&self, strategy: Strategy) -> Result<SimulationBatch> {
        let seed = self.seed_for(strategy);
        if self.parallel {
            let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
            par_simulate_n_games(self.trials, strategy, seed)
        } else {
            match seed {
                Some(seed) => Simulator::seeded(seed).play_n(self.trials, strategy),
                None => simulate_n_games(self.trials, strategy, &mut rand::thread_rng()),
            }
        }
    }
}

// 把从 1 开始的门序号转换成数组下标
fn door_slot(door: u32) -> Result<usize> {
    if (1..=DOORS).contains(&door) {
        Ok((door - 1) as usize)
    } else {
        Err(Error::OutOfRange { door })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn random_game_has_one_car() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut cars = [0u32; DOORS as usize];
        for _ in 0..30000 {
            let game = Game::random(&mut rng);
            let goats = game.doors().iter().filter(|c| **c == Content::Goat).count();
            assert_eq!(goats, 2);
            cars[(game.car() - 1) as usize] += 1;
        }
        for count in cars {
            let share = count as f64 / 30000.0;
            assert!((share - 1.0 / 3.0).abs() < 0.02, "car share = {share}");
        }
    }

    #[test]
    fn new_rejects_bad_contents() {
        assert!(matches!(
            Game::new([Content::Goat; 3]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            Game::new([Content::Car, Content::Car, Content::Goat]),
            Err(Error::InvalidArgument(_))
        ));
        let game = Game::new([Content::Goat, Content::Car, Content::Goat]).unwrap();
        assert_eq!(game.car(), 2);
    }

    #[test]
    fn with_car_and_content() {
        let game = Game::with_car(3).unwrap();
        assert_eq!(game.content(3), Ok(Content::Car));
        assert_eq!(game.content(1), Ok(Content::Goat));
        assert_eq!(game.content(0), Err(Error::OutOfRange { door: 0 }));
        assert_eq!(Game::with_car(4), Err(Error::OutOfRange { door: 4 }));
    }

    #[test]
    fn switch_seed_range_is_disjoint() {
        let settings = Settings::new(500).with_seed(10);
        assert_eq!(settings.seed_for(Strategy::Stay), Some(10));
        assert_eq!(settings.seed_for(Strategy::Switch), Some(510));
        assert_eq!(Settings::new(500).seed_for(Strategy::Stay), None);
    }

    #[test]
    fn deserialize_checks_cars() {
        let game: Game = serde_json::from_str(r#"{"doors":["Goat","Car","Goat"]}"#).unwrap();
        assert_eq!(game.car(), 2);

        let none = serde_json::from_str::<Game>(r#"{"doors":["Goat","Goat","Goat"]}"#);
        assert!(none.is_err());
        let two = serde_json::from_str::<Game>(r#"{"doors":["Car","Car","Goat"]}"#);
        assert!(two.is_err());
    }

    #[test]
    fn settings_from_partial_json() {
        let settings: Settings = serde_json::from_str(r#"{"seed": 3}"#).unwrap();
        assert_eq!(settings, Settings::default().with_seed(3));
    }
}
