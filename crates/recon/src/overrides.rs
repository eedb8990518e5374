//! Curated override tables.
//!
//! Three small hand-maintained indexes collected from observed mismatches
//! between the wiki and the target catalog:
//!
//! - `spelling`: ordered literal substitutions applied by the normalizer,
//!   mapping a wiki spelling onto the catalog's spelling.
//! - `special_cases`: source-name fragment → target-name fragment, consulted
//!   by the special-case stage of the cascade.
//! - `nicknames`: primary name → community nicknames, merged into entity
//!   alias lists during ingest.
//!
//! The tables are plain data: built-in defaults, optionally extended or
//! replaced from the `[overrides]` section of the config.

use serde::Deserialize;

use crate::error::ReconError;

const SPELLING: &[(&str, &str)] = &[
    ("多布雷尼亚", "多布雷尼娅"),
    ("太空伊什塔尔", "太空埃列什基伽勒"),
    ("武藏坊弁庆", "武藏坊辨庆"),
    ("克里斯汀", "克里斯蒂安"),
    ("丝卡蒂", "斯卡蒂"),
    ("格里戈里·拉斯普京", "言峰绮礼"),
    ("拉斯普京", "言峰绮礼"),
    ("堂·吉诃德", "堂吉诃德"),
];

const SPECIAL_CASES: &[(&str, &str)] = &[
    ("阿育王", "阿育王AshokaAshoka"),
    ("查理曼", "查理大帝"),
    ("克琳希德", "布伦希尔德"),
    ("上杉谦信", "长尾景虎"),
    ("大和武尊", "日本武尊"),
    ("诺克娜蕾·雅兰杜", "诺克纳蕾·雅兰杜"),
    ("莱妮丝", "莱妮丝·埃尔梅罗·阿奇佐尔缇"),
    ("齐格飞", "齐格弗里德"),
    ("山鲁佐德", "雪赫拉莎德"),
    ("杀生院祈荒", "杀生院"),
    ("百貌哈桑", "百貌的哈桑"),
    ("静谧哈桑", "静谧的哈桑"),
    ("咒腕哈桑", "咒腕的哈桑"),
    ("BB迪拜", "BB"),
    ("谜之代行者C.I.E.L", "希耶尔"),
    ("响＆千键", "日比乃响"),
    ("岩窟王　基督山", "基督山伯爵 爱德蒙·唐泰斯"),
    ("阿维斯布隆", "齐格鲁德"),
    ("玄奘三藏", "玄奘三蔵"),
    ("BeastⅢ／L", "杀生院"),
    ("伊莉雅", "伊莉雅斯菲尔·冯·爱因兹贝伦"),
    ("克洛伊·冯·爱因兹贝伦", "伊莉雅斯菲尔·冯·爱因兹贝伦"),
    ("美游·艾德费尔特", "美游"),
    ("宫本武藏", "新免武藏守藤原玄信"),
    ("夏洛特·科黛", "夏绿蒂·科黛"),
    ("尼禄", "尼禄·克劳狄乌斯"),
    ("闪闪", "吉尔伽美什"),
    ("黑贞", "贞德（Alter）"),
    ("斯卡蒂", "斯卡哈·斯卡蒂"),
    ("克里斯蒂安", "克里斯蒂娜"),
];

const NICKNAMES: &[(&str, &[&str])] = &[
    ("阿尔托莉雅·潘德拉贡", &["阿尔托莉雅", "呆毛王", "棉被", "蓝傻", "圣剑"]),
    ("尼禄·克劳狄乌斯", &["尼禄", "红傻", "umu"]),
    ("斯卡哈", &["师匠"]),
    ("贞德", &["村姑"]),
    ("伊丽莎白·巴托里", &["伊丽莎白", "龙娘"]),
    ("冲田总司", &["冲田", "总司"]),
    ("谜之女主角X", &["X毛", "星战傻"]),
    ("阿尔托莉雅·潘德拉贡〔Alter〕", &["黑呆", "黑saber"]),
    ("贞德〔Alter〕", &["黑贞", "黑村姑"]),
    ("库·丘林〔Alter〕", &["狂狗", "黑狗"]),
    ("吉尔伽美什", &["金闪闪", "金皮卡", "吉尔"]),
    ("伊斯坎达尔", &["大帝", "肌肉王", "征服王"]),
    ("梅林", &["花之魔术师", "花之逃亡者", "梅林子"]),
    ("阿比盖尔·威廉姆斯", &["阿比", "小阿比"]),
    ("喀耳刻", &["猪神", "C子"]),
    ("魁札尔科亚特尔", &["羽蛇神", "魁扎尔"]),
    ("岩窟王", &["基督山伯爵", "爱德蒙·唐泰斯"]),
    ("阿尔托莉雅·潘德拉贡〔Lancer〕", &["狮子王", "白枪呆"]),
    ("阿尔托莉雅·潘德拉贡〔Lancer Alter〕", &["黑枪呆"]),
    ("阿尔托莉雅·潘德拉贡〔Santa Alter〕", &["骑呆", "黑骑呆"]),
    ("玉藻前", &["小玉", "狐狸", "JK狐"]),
    ("赫克托耳", &["狗哥"]),
    ("罗穆路斯", &["狼祖"]),
    ("BB", &["月BB", "樱BB"]),
    ("凯妮斯", &["奥德修斯", "奥德修斯·卡隆"]),
    ("兰陵王", &["兰陵王高长恭", "高长恭"]),
    ("哪吒", &["三太子"]),
    ("宇津见绘里世", &["绘里世"]),
    ("物部布都", &["布都"]),
    ("帕里斯", &["亚历山大"]),
    ("清少纳言", &["清少"]),
    ("项羽", &["项籍"]),
    ("马嘶", &["马嘶·Ashwatthaman", "阿斯瓦塔曼"]),
    ("卡利古拉", &["盖乌斯·尤利乌斯·凯撒·奥古斯都·日耳曼尼库斯", "加里古拉"]),
    ("韦伯·维尔维特", &["君主·埃尔梅罗二世", "埃尔梅罗二世", "埃二", "二世"]),
    ("克娄巴特拉", &["艳后", "埃及艳后"]),
    ("尼古拉·特斯拉", &["特斯拉"]),
    ("戈尔贡", &["美杜莎"]),
    ("梅杜莎（Lancer）", &["安娜", "美杜莎"]),
    ("上杉谦信", &["长尾景虎"]),
    ("李书文", &["老李", "李书文(Assassin)"]),
    ("杀生院祈荒", &["杀生院", "祈荒"]),
    ("夏绿蒂·科黛", &["夏洛特"]),
    ("沃尔夫冈·阿马德乌斯·莫扎特", &["莫扎特"]),
    ("罗宾汉", &["罗宾"]),
    ("诸葛孔明", &["孔明", "诸葛亮"]),
    ("查尔斯·巴贝奇", &["巴贝奇"]),
    ("苏利耶", &["日神"]),
    ("弗朗西斯·德雷克", &["船长", "海盗船长"]),
    ("图坦卡蒙", &["ツタンカーメン", "Tutankhamun", "法老王"]),
    ("理查Ⅰ世", &["理查德一世", "狮心王", "Richard I", "リチャードⅠ世"]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overrides {
    pub spelling: Vec<(String, String)>,
    pub special_cases: Vec<(String, String)>,
    pub nicknames: Vec<(String, Vec<String>)>,
}

impl Default for Overrides {
    fn default() -> Self {
        fn pairs(table: &[(&str, &str)]) -> Vec<(String, String)> {
            table.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
        }
        Self {
            spelling: pairs(SPELLING),
            special_cases: pairs(SPECIAL_CASES),
            nicknames: NICKNAMES
                .iter()
                .map(|(name, nicks)| {
                    (name.to_string(), nicks.iter().map(|n| n.to_string()).collect())
                })
                .collect(),
        }
    }
}

impl Overrides {
    /// Tables with no entries at all.
    pub fn empty() -> Self {
        Self {
            spelling: Vec::new(),
            special_cases: Vec::new(),
            nicknames: Vec::new(),
        }
    }

    /// Build the effective tables from the built-in defaults and a config section.
    pub fn from_config(config: &OverridesConfig) -> Self {
        let mut tables = match config.mode {
            OverrideMode::Extend => Self::default(),
            OverrideMode::Replace => Self::empty(),
        };
        tables.spelling.extend(config.spelling.iter().cloned());
        tables.special_cases.extend(config.special_cases.iter().cloned());
        for (name, nicks) in &config.nicknames {
            match tables.nicknames.iter_mut().find(|(n, _)| n == name) {
                Some((_, existing)) => {
                    for nick in nicks {
                        if !existing.contains(nick) {
                            existing.push(nick.clone());
                        }
                    }
                }
                None => tables.nicknames.push((name.clone(), nicks.clone())),
            }
        }
        tables
    }

    pub fn nicknames_for(&self, name: &str) -> &[String] {
        self.nicknames
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, nicks)| nicks.as_slice())
            .unwrap_or(&[])
    }

    /// Reject tables that would make normalization non-idempotent or
    /// match everything.
    pub fn validate(&self) -> Result<(), ReconError> {
        for (from, to) in &self.spelling {
            if from.is_empty() {
                return Err(ReconError::ConfigValidation(
                    "spelling table: empty pattern".into(),
                ));
            }
            if let Some(c) = to.chars().find(|c| REWRITTEN_CHARS.contains(c)) {
                return Err(ReconError::ConfigValidation(format!(
                    "spelling table: replacement '{to}' (for '{from}') contains '{c}', which normalization rewrites"
                )));
            }
            if let Some((pattern, _)) = self.spelling.iter().find(|(p, _)| can_rebuild(to, p)) {
                return Err(ReconError::ConfigValidation(format!(
                    "spelling table: replacement '{to}' (for '{from}') re-triggers pattern '{pattern}'"
                )));
            }
        }
        for (from, to) in &self.special_cases {
            if from.is_empty() || to.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "special case table: empty fragment in ['{from}', '{to}']"
                )));
            }
        }
        Ok(())
    }
}

/// Characters the normalizer rewrites before the spelling step.
const REWRITTEN_CHARS: &[char] = &['\u{30FB}', '/', '(', ')', '（', '）', '〔', '〕'];

/// Whether substituting `to` into arbitrary text can leave an occurrence
/// of `pattern`, alone or together with the characters around it.
fn can_rebuild(to: &str, pattern: &str) -> bool {
    if to.is_empty() {
        // the neighbours join up
        return pattern.chars().count() > 1;
    }
    if to.contains(pattern) || pattern.contains(to) {
        return true;
    }
    let cuts = pattern.char_indices().skip(1).map(|(i, _)| i);
    for cut in cuts {
        let (head, tail) = pattern.split_at(cut);
        if to.ends_with(head) || to.starts_with(tail) {
            return true;
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Config section
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideMode {
    #[default]
    Extend,
    Replace,
}

/// `[overrides]` section of a recon config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverridesConfig {
    #[serde(default)]
    pub mode: OverrideMode,
    #[serde(default)]
    pub spelling: Vec<(String, String)>,
    #[serde(default)]
    pub special_cases: Vec<(String, String)>,
    #[serde(default)]
    pub nicknames: std::collections::BTreeMap<String, Vec<String>>,
}
