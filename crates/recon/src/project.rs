//! Output projector: raw attributes → display record.

use indexmap::IndexMap;

use crate::model::{AttributeDisplay, Attributes, DisplayRecord, Rendering};

const CLASS_LABELS: &[(&str, &str)] = &[
    ("Saber", "剑兵"),
    ("Archer", "弓兵"),
    ("Lancer", "枪兵"),
    ("Rider", "骑兵"),
    ("Caster", "术师"),
    ("Assassin", "刺客"),
    ("Berserker", "狂战士"),
    ("Ruler", "裁定者"),
    ("Avenger", "复仇者"),
    ("AlterEgo", "Alterego"),
    ("MoonCancer", "月癌"),
    ("Foreigner", "外星人"),
    ("Pretender", "诱饵"),
    ("Shielder", "盾兵"),
    ("Beast", "Beast"),
];

const CARD_LABELS: &[(&str, &str)] = &[("Quick", "绿卡"), ("Arts", "蓝卡"), ("Buster", "红卡")];

/// Ordered; every keyword found in the raw value becomes its own entry.
pub const ACQUISITION_KEYWORDS: &[&str] = &[
    "圣晶石常驻",
    "友情点召唤",
    "剧情限定",
    "期间限定",
    "活动赠送",
    "通关赠送",
    "无法获得",
    "剧情解锁",
    "初始获得",
    "其他",
];

pub fn project(attributes: &Attributes) -> DisplayRecord {
    DisplayRecord {
        rarity: identity(&attributes.rarity),
        class: project_class(&attributes.class, &attributes.rarity),
        np_card: project_card(&attributes.np_card),
        np_type: identity(&attributes.np_type),
        acquisition: project_acquisition(&attributes.acquisition),
    }
}

fn identity(raw: &str) -> AttributeDisplay {
    single(raw, Rendering::text(raw))
}

fn single(label: &str, rendering: Rendering) -> AttributeDisplay {
    IndexMap::from([(label.to_string(), rendering)])
}

fn lookup<'a>(table: &'a [(&str, &str)], raw: &str) -> Option<&'a str> {
    table.iter().find(|(k, _)| *k == raw).map(|(_, v)| *v)
}

pub fn class_label(class: &str) -> &str {
    lookup(CLASS_LABELS, class).unwrap_or(class)
}

/// Card frame tier from the rarity's leading digit. A rarity that does not
/// start with a digit counts as 5.
pub fn rarity_tier(rarity: &str) -> &'static str {
    match rarity.chars().next() {
        Some(c) if c.is_ascii_digit() => match c {
            '4' | '5' => "金卡",
            '3' => "银卡",
            _ => "铜卡",
        },
        _ => "金卡",
    }
}

fn project_class(class: &str, rarity: &str) -> AttributeDisplay {
    let label = class_label(class);
    let icon = format!("/assets/tag/fgo/Class/{}{}.png", rarity_tier(rarity), class);
    single(label, Rendering::with_icon(icon, label))
}

fn project_card(card: &str) -> AttributeDisplay {
    match lookup(CARD_LABELS, card) {
        Some(label) => single(
            label,
            Rendering::with_icon(format!("/assets/tag/fgo/Color/{card}.png"), label),
        ),
        None => identity(card),
    }
}

fn project_acquisition(raw: &str) -> AttributeDisplay {
    let found: AttributeDisplay = ACQUISITION_KEYWORDS
        .iter()
        .filter(|k| raw.contains(*k))
        .map(|k| (k.to_string(), Rendering::text(*k)))
        .collect();
    if found.is_empty() {
        identity(raw)
    } else {
        found
    }
}
