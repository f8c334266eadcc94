//! 名称生成
//!
//! 每个命名库由词根、城镇后缀和国家后缀组成。文化、城镇、国家、河流和
//! 神祇的名字都从所属文化的命名库中拼出。

use crate::rng::MapRng;

/// 命名库
#[derive(Debug, Clone, Copy)]
pub struct NameBase {
    pub name: &'static str,
    pub roots: &'static [&'static str],
    pub burg_suffixes: &'static [&'static str],
    pub state_suffixes: &'static [&'static str],
}

pub const GERMAN: usize = 0;
pub const ENGLISH: usize = 1;
pub const FRENCH: usize = 2;
pub const ITALIAN: usize = 3;
pub const CASTILLIAN: usize = 4;
pub const RUTHENIAN: usize = 5;
pub const NORDIC: usize = 6;
pub const GREEK: usize = 7;
pub const CHINESE: usize = 8;
pub const JAPANESE: usize = 9;
pub const ARABIC: usize = 10;
pub const TURKIC: usize = 11;

pub const NAME_BASES: [NameBase; 12] = [
    NameBase {
        name: "German",
        roots: &[
            "Ald", "Bern", "Dorn", "Eich", "Falk", "Grün", "Hal", "Hohen", "Kirch", "Lind", "Mar",
            "Neu", "Ober", "Ros", "Stein", "Wald", "Wolf", "Zell",
        ],
        burg_suffixes: &["burg", "dorf", "stadt", "heim", "hausen", "feld", "berg", "bach"],
        state_suffixes: &["land", "mark", "ia"],
    },
    NameBase {
        name: "English",
        roots: &[
            "Ash", "Brad", "Cam", "Dun", "Elm", "Ford", "Glen", "Hart", "King", "Lang", "Mill",
            "North", "Oak", "Red", "Stan", "Wick", "Win", "York",
        ],
        burg_suffixes: &["ton", "ham", "ford", "bury", "wick", "field", "ley", "worth"],
        state_suffixes: &["shire", "land", "ia"],
    },
    NameBase {
        name: "French",
        roots: &[
            "Beau", "Bel", "Chat", "Font", "Mont", "Roch", "Mar", "Lyon", "Val", "Bour", "Char",
            "Aur", "Cler", "Gren", "Nev", "Sen",
        ],
        burg_suffixes: &["ville", "court", "mont", "bourg", "ais", "eux", "ac", "y"],
        state_suffixes: &["ie", "ance", "ois"],
    },
    NameBase {
        name: "Italian",
        roots: &[
            "Ancon", "Bell", "Castel", "Fior", "Lucc", "Mont", "Pal", "Rav", "Sal", "Ser", "Ter",
            "Vall", "Ven", "Ver", "Ros", "Cas",
        ],
        burg_suffixes: &["ano", "etto", "ona", "ello", "ino", "ica", "ia", "ora"],
        state_suffixes: &["ia", "ana", "esia"],
    },
    NameBase {
        name: "Castillian",
        roots: &[
            "Alc", "Bar", "Cal", "Cor", "Gran", "Mal", "Med", "Mur", "Pal", "Sal", "Sev", "Tol",
            "Val", "Zar", "Bad", "Leo",
        ],
        burg_suffixes: &["ada", "eja", "illa", "ena", "ona", "on", "ares", "ida"],
        state_suffixes: &["ia", "esa", "ena"],
    },
    NameBase {
        name: "Ruthenian",
        roots: &[
            "Bel", "Bor", "Dub", "Gor", "Kam", "Kras", "Lug", "Mir", "Nov", "Pol", "Rad", "Slav",
            "Vel", "Vol", "Zel", "Yar",
        ],
        burg_suffixes: &["grad", "ov", "sk", "in", "ets", "ichi", "ino", "evo"],
        state_suffixes: &["ia", "ovia", "ania"],
    },
    NameBase {
        name: "Nordic",
        roots: &[
            "Ask", "Bjør", "Dal", "Eid", "Fjell", "Gard", "Hag", "Hval", "Kvi", "Lund", "Nor",
            "Ros", "Sol", "Sval", "Tor", "Vik",
        ],
        burg_suffixes: &["heim", "vik", "stad", "by", "fjord", "holm", "dal", "sund"],
        state_suffixes: &["mark", "gard", "land"],
    },
    NameBase {
        name: "Greek",
        roots: &[
            "Ale", "Ath", "Cor", "Del", "Eph", "Ithak", "Kall", "Lar", "Mess", "Myk", "Nax", "Pyl",
            "Rho", "Sam", "Thes", "Zak",
        ],
        burg_suffixes: &["os", "polis", "ia", "ion", "ene", "ai", "ikon", "aros"],
        state_suffixes: &["is", "ia", "onia"],
    },
    NameBase {
        name: "Chinese",
        roots: &[
            "An", "Bao", "Chang", "Dong", "Fu", "Guang", "Hai", "Jin", "Lan", "Ming", "Nan",
            "Qing", "Shan", "Tai", "Wu", "Xi",
        ],
        burg_suffixes: &["an", "zhou", "jing", "ning", "yang", "cheng", "ling", "shan"],
        state_suffixes: &["guo", "an", "hai"],
    },
    NameBase {
        name: "Japanese",
        roots: &[
            "Aki", "Fuji", "Haru", "Hiro", "Ishi", "Kana", "Kyo", "Matsu", "Naga", "Oka", "Saka",
            "Taka", "Toyo", "Yama", "Yoko", "Shira",
        ],
        burg_suffixes: &["shima", "yama", "oka", "gawa", "hama", "saki", "zawa", "no"],
        state_suffixes: &["koku", "shu", "ra"],
    },
    NameBase {
        name: "Arabic",
        roots: &[
            "Al", "Bag", "Dam", "Far", "Ham", "Jaz", "Kar", "Mad", "Naj", "Qas", "Raq", "Sab",
            "Tab", "Yam", "Zar", "Har",
        ],
        burg_suffixes: &["ad", "ira", "ah", "an", "ar", "abad", "iya", "un"],
        state_suffixes: &["ia", "istan", "ad"],
    },
    NameBase {
        name: "Turkic",
        roots: &[
            "Ak", "Ala", "Bay", "Bur", "Kara", "Kiz", "Orta", "Sar", "Tash", "Ulu", "Yal", "Kum",
            "Ert", "Sev", "Tur", "Yen",
        ],
        burg_suffixes: &["kent", "abad", "li", "ova", "hisar", "su", "tepe", "kale"],
        state_suffixes: &["istan", "eli", "han"],
    },
];

const LINKS: [&str; 8] = ["a", "o", "en", "ar", "is", "el", "", ""];

fn is_vowel(c: char) -> bool {
    "aeiouyøüöäéó".contains(c.to_ascii_lowercase())
}

fn base(index: usize) -> &'static NameBase {
    &NAME_BASES[index % NAME_BASES.len()]
}

fn pick(list: &'static [&'static str], rng: &mut MapRng) -> &'static str {
    rng.pick(list).copied().unwrap_or("")
}

/// 首字母大写
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// 去掉词尾元音（至少保留 3 个字符）
pub fn trim_vowels(name: &str) -> String {
    let mut s: Vec<char> = name.chars().collect();
    while s.len() > 3 && s.last().is_some_and(|&c| is_vowel(c)) {
        s.pop();
    }
    s.into_iter().collect()
}

/// 拼接两个部分，去掉连接处重复的字母
fn join(left: &str, right: &str) -> String {
    match (left.chars().last(), right.chars().next()) {
        (Some(a), Some(b)) if a.eq_ignore_ascii_case(&b) => {
            let mut rest = right.chars();
            rest.next();
            format!("{left}{}", rest.as_str())
        }
        _ => format!("{left}{right}"),
    }
}

/// 文化简称
pub fn culture_short(base_index: usize, rng: &mut MapRng) -> String {
    let b = base(base_index);
    let root = pick(b.roots, rng);
    capitalize(&join(root, pick(&LINKS, rng)))
}

/// 城镇名
pub fn burg_name(base_index: usize, rng: &mut MapRng) -> String {
    let b = base(base_index);
    if rng.probability(0.1) {
        return culture_short(base_index, rng);
    }
    let root = pick(b.roots, rng);
    capitalize(&join(root, pick(b.burg_suffixes, rng)))
}

/// 国家名，由简称去掉词尾元音后加上国家后缀
pub fn state_name(base_index: usize, short: &str, rng: &mut MapRng) -> String {
    let b = base(base_index);
    if rng.probability(0.2) {
        return short.to_owned();
    }
    let stem = trim_vowels(short);
    capitalize(&join(&stem, pick(b.state_suffixes, rng)))
}

/// 河流名
pub fn river_name(base_index: usize, rng: &mut MapRng) -> String {
    culture_short(base_index, rng)
}

/// 形容词形式
pub fn adjective(name: &str) -> String {
    let lower = name.to_lowercase();
    if lower.ends_with("land") {
        return format!("{name}ic");
    }
    if lower.ends_with("ia") || lower.ends_with('a') {
        return format!("{name}n");
    }
    if let Some(stem) = name.strip_suffix('y') {
        return format!("{stem}ian");
    }
    if lower.ends_with('e') {
        return format!("{name}an");
    }
    if lower.ends_with("an") || lower.ends_with("ish") {
        return name.to_owned();
    }
    format!("{name}ian")
}

/// 两字母缩写，与 `taken` 中的已有缩写不重复
pub fn abbreviate(name: &str, taken: &[String]) -> String {
    let parsed = name.replace("Old ", "O ");
    let words: Vec<&str> = parsed.split_whitespace().collect();
    let letters: Vec<char> = words.concat().chars().collect();
    if letters.is_empty() {
        return String::new();
    }

    let mut code: String = if words.len() == 2 {
        words
            .iter()
            .filter_map(|w| w.chars().next())
            .collect()
    } else {
        letters.iter().take(2).collect()
    };
    let mut i = 1;
    while i + 1 < letters.len() && taken.contains(&code) {
        code = format!("{}{}", letters[0], letters[i].to_uppercase());
        i += 1;
    }
    code
}

const DEITY_BEINGS: [&str; 14] = [
    "Father", "Mother", "Lord", "Lady", "Keeper", "Giver", "Watcher", "Spirit", "Serpent", "Wolf",
    "Eagle", "Bull", "Stag", "Judge",
];
const DEITY_ADJECTIVES: [&str; 10] = [
    "Eternal", "Great", "Holy", "Silent", "Golden", "Wise", "Ancient", "First", "Hidden",
    "Radiant",
];
const DEITY_DOMAINS: [&str; 14] = [
    "Sun", "Moon", "Sky", "Storm", "Earth", "Sea", "Fire", "Light", "Dawn", "Mountain", "Forest",
    "River", "Wind", "Stars",
];

/// 神祇名："名字, 称号"
pub fn deity_name(base_index: usize, rng: &mut MapRng) -> String {
    let name = culture_short(base_index, rng);
    let being = pick(&DEITY_BEINGS, rng);
    let meaning = if rng.probability(0.5) {
        format!("The {} {being}", pick(&DEITY_ADJECTIVES, rng))
    } else {
        format!("The {being} of {}", pick(&DEITY_DOMAINS, rng))
    };
    format!("{name}, {meaning}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_capitalized_and_non_empty() {
        let mut rng = MapRng::new("names");
        for b in 0..NAME_BASES.len() {
            for _ in 0..20 {
                let burg = burg_name(b, &mut rng);
                assert!(burg.chars().next().unwrap().is_uppercase(), "{burg}");
                let short = culture_short(b, &mut rng);
                let state = state_name(b, &short, &mut rng);
                assert!(!state.is_empty());
                assert!(state.chars().next().unwrap().is_uppercase(), "{state}");
            }
        }
    }

    #[test]
    fn test_trim_vowels() {
        assert_eq!(trim_vowels("Italia"), "Ital");
        assert_eq!(trim_vowels("Ava"), "Ava");
        assert_eq!(trim_vowels("Norse"), "Nors");
    }

    #[test]
    fn test_adjective() {
        assert_eq!(adjective("Italia"), "Italian");
        assert_eq!(adjective("Norway"), "Norwaian");
        assert_eq!(adjective("Holland"), "Hollandic");
        assert_eq!(adjective("Rome"), "Romean");
        assert_eq!(adjective("Kent"), "Kentian");
    }

    #[test]
    fn abbreviations_avoid_taken_codes() {
        assert_eq!(abbreviate("Angshire", &[]), "An");
        assert_eq!(abbreviate("Old Norse", &[]), "ON");
        let taken = vec!["An".to_owned()];
        assert_eq!(abbreviate("Angshire", &taken), "AN");
    }

    #[test]
    fn deity_has_title() {
        let mut rng = MapRng::new("deity");
        let deity = deity_name(GREEK, &mut rng);
        assert!(deity.contains(", The "));
    }

    #[test]
    fn join_drops_doubled_letter() {
        assert_eq!(join("Hal", "ley"), "Haley");
        assert_eq!(join("Win", "ton"), "Winton");
    }
}
