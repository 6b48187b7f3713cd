//! Static synonym tables, frozen at build time and consulted read-only by
//! the relevance engine. Two maps: per-token synonym sets and per-phrase
//! (2- or 3-word normalized string) synonym sets.

use std::collections::HashMap;
use std::sync::LazyLock;

pub static TOKEN_SYNONYMS: LazyLock<HashMap<&'static str, Vec<&'static str>>> =
    LazyLock::new(|| {
        HashMap::from([
            (
                "dog",
                vec![
                    "dog", "dogs", "canine", "canines", "chien", "chiens", "k9", "k-9",
                    "working dog",
                ],
            ),
            (
                "canine",
                vec!["canine", "canines", "chien", "chiens", "k9", "dog", "dogs"],
            ),
            (
                "mine",
                vec![
                    "mine",
                    "mines",
                    "landmine",
                    "landmines",
                    "land mine",
                    "land mines",
                    "uxo",
                    "ordnance",
                    "explosive",
                    "explosives",
                    "ied",
                    "ieds",
                    "munition",
                    "munitions",
                ],
            ),
            (
                "detection",
                vec![
                    "detection",
                    "detect",
                    "detects",
                    "detecting",
                    "detected",
                    "detector",
                    "detectors",
                    "reperage",
                    "detection",
                    "detecteur",
                    "detecteurs",
                    "identification",
                ],
            ),
            (
                "explosive",
                vec![
                    "explosive",
                    "explosives",
                    "explosif",
                    "explosifs",
                    "bomb",
                    "bombs",
                    "bomblet",
                    "mine",
                    "ordnance",
                    "ied",
                    "ieds",
                    "uxo",
                ],
            ),
            (
                "odor",
                vec![
                    "odor",
                    "odors",
                    "odour",
                    "odours",
                    "scent",
                    "scents",
                    "olfaction",
                    "olfactory",
                    "olfactif",
                    "odorant",
                    "odorants",
                    "smell",
                    "smells",
                    "sniff",
                    "sniffing",
                ],
            ),
            ("dog-handler", vec!["handler", "guide", "team", "binome"]),
            ("robot", vec!["robot", "robotics", "robotique", "autonomous", "autonome"]),
            ("review", vec!["review", "survey", "overview", "state of the art", "revue"]),
        ])
    });

pub static PHRASE_SYNONYMS: LazyLock<HashMap<&'static str, Vec<&'static str>>> =
    LazyLock::new(|| {
        HashMap::from([
            (
                "mine detection",
                vec![
                    "mine detection",
                    "landmine detection",
                    "explosive detection",
                    "explosives detection",
                    "bomb detection",
                    "detection de mine",
                    "detection de mines",
                    "detection des mines",
                ],
            ),
            (
                "explosive detection",
                vec![
                    "explosive detection",
                    "explosives detection",
                    "explosive sniffing",
                    "explosive sensing",
                    "explosive trace detection",
                    "detection d explosifs",
                ],
            ),
            (
                "detection dog",
                vec![
                    "detection dog",
                    "detection dogs",
                    "explosive detection dog",
                    "sniffer dog",
                    "chien detecteur",
                    "chien de detection",
                    "chien demineur",
                ],
            ),
            (
                "search dog",
                vec![
                    "search dog",
                    "search dogs",
                    "working dog",
                    "chien de recherche",
                    "chien pisteur",
                ],
            ),
        ])
    });
