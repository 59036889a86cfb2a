// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for asset synchronization and the image cache

mod support;

mod image_cache_tests;
mod resolver_tests;
mod service_tests;
