//! Attempt parameter randomizer. Every attempt gets a fresh persona, scene
//! and phrasing mix so consecutive reviews do not read alike.

use rand::seq::SliceRandom;
use rand::Rng;

/// Probability that an attempt asks for a mostly-positive review with a minor complaint.
pub const NEGATIVE_SENTIMENT_PROBABILITY: f64 = 0.3;

pub const ROLES: [&str; 10] = [
    "美食博主",
    "普通上班族",
    "年轻情侣",
    "家庭主妇",
    "资深吃货",
    "外地旅客",
    "商务人士",
    "学生党",
    "退休老人",
    "附近居民",
];

pub const SCENES: [&str; 10] = [
    "朋友聚会",
    "商务宴请",
    "家庭聚餐",
    "情侣约会",
    "独自用餐",
    "生日庆祝",
    "周末休闲",
    "匆忙午餐",
    "深夜宵夜",
    "庆祝纪念日",
];

pub const STYLES: [&str; 10] = [
    "随意口语",
    "简短直接",
    "碎碎念风",
    "夸张活泼",
    "接地气吐槽",
    "日常闲聊",
    "朋友推荐",
    "真实记录",
    "个人体验",
    "俏皮幽默",
];

pub const CASUAL_EXPRESSIONS: [&str; 8] = [
    "真的超级赞👍",
    "老板人超好",
    "朋友强烈推荐的",
    "路过偶然发现",
    "性价比挺高",
    "服务态度不错",
    "味道一级棒",
    "菜量挺足的",
];

pub const FILLER_WORDS: [&str; 10] = [
    "反正",
    "就是",
    "感觉",
    "说实话",
    "老实讲",
    "不得不说",
    "emmm",
    "说真的",
    "讲道理",
    "哇塞",
];

pub const CLOSING_PHRASES: [&str; 8] = [
    "推荐打卡~",
    "强烈安利！",
    "下次还会再来！",
    "值得一试！",
    "绝对不踩雷！",
    "不枉此行！",
    "回头客没跑了！",
    "强推！",
];

/// Stylistic knobs for a single attempt. Built fresh per attempt, never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptParameters {
    pub role: &'static str,
    pub scene: &'static str,
    pub style: &'static str,
    pub casual_expression: &'static str,
    pub filler_word: &'static str,
    pub closing_phrase: &'static str,
    pub include_negative_sentiment: bool,
}

/// Draws every field independently and uniformly from its pool.
pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> AttemptParameters {
    AttemptParameters {
        role: pick(rng, &ROLES),
        scene: pick(rng, &SCENES),
        style: pick(rng, &STYLES),
        casual_expression: pick(rng, &CASUAL_EXPRESSIONS),
        filler_word: pick(rng, &FILLER_WORDS),
        closing_phrase: pick(rng, &CLOSING_PHRASES),
        include_negative_sentiment: rng.gen_bool(NEGATIVE_SENTIMENT_PROBABILITY),
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, pool: &[&'static str]) -> &'static str {
    // pools are non-empty constants
    pool.choose(rng).copied().unwrap_or_default()
}
